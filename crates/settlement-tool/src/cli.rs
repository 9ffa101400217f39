use {
    alloy::primitives::Address,
    settlement_encoding::OrderUid,
    std::path::PathBuf,
};

#[derive(Debug, clap::Parser)]
pub struct Args {
    /// Path to the domain configuration file. This file should be in TOML
    /// format. Without it the mainnet settlement contract domain is used.
    #[clap(long, env)]
    pub config: Option<PathBuf>,

    /// The log filter.
    #[clap(long, env, default_value = "warn,settlement_tool=info,settlement_encoding=debug")]
    pub log_filter: String,

    /// At which log level logs should be printed to stderr instead of stdout.
    #[clap(long, env)]
    pub log_stderr_threshold: Option<tracing::Level>,

    /// Whether to use JSON format for the logs.
    #[clap(long, env, default_value = "false")]
    pub use_json_logs: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// Decodes and authenticates an encoded settlement and prints it as JSON.
    Decode(Decode),
    /// Splits an order UID into its order digest, owner and validity.
    Uid {
        /// The 56 byte order UID as 0x prefixed hex.
        uid: OrderUid,
    },
    /// Prints the configured domain and its separator.
    Domain,
}

#[derive(Debug, clap::Args)]
pub struct Decode {
    /// Path to a JSON file containing the encoded settlement. Replaces the
    /// other arguments.
    #[clap(long, conflicts_with_all = ["tokens", "trades", "interactions", "interaction_count"])]
    pub settlement: Option<PathBuf>,

    /// The settlement token table, separated by commas.
    #[clap(long, value_delimiter = ',')]
    pub tokens: Vec<Address>,

    /// The encoded trades as hex.
    #[clap(long, value_parser = parse_bytes, default_value = "0x")]
    pub trades: Bytes,

    /// The encoded interactions as hex.
    #[clap(long, value_parser = parse_bytes, default_value = "0x")]
    pub interactions: Bytes,

    /// The number of encoded interactions. Defaults to the maximum number of
    /// interactions that fit into the encoded interactions.
    #[clap(long)]
    pub interaction_count: Option<usize>,
}

/// Clap treats `Vec<T>` arguments as repeated values, so decoded byte
/// arguments are wrapped.
#[derive(Clone, Debug, Default)]
pub struct Bytes(pub Vec<u8>);

fn parse_bytes(s: &str) -> Result<Bytes, const_hex::FromHexError> {
    const_hex::decode(s.strip_prefix("0x").unwrap_or(s)).map(Bytes)
}

#[cfg(test)]
mod tests {
    use {super::*, clap::Parser};

    #[test]
    fn parses_decode_arguments() {
        let args = Args::try_parse_from([
            "settlement-tool",
            "--log-filter",
            "debug",
            "decode",
            "--tokens",
            "0x0101010101010101010101010101010101010101,0x0202020202020202020202020202020202020202",
            "--trades",
            "0xcafe",
            "--interaction-count",
            "2",
        ])
        .unwrap();
        assert_eq!(args.log_filter, "debug");
        assert!(args.config.is_none());
        let Command::Decode(decode) = args.command else {
            panic!("expected decode command");
        };
        assert_eq!(
            decode.tokens,
            [Address::repeat_byte(1), Address::repeat_byte(2)]
        );
        assert_eq!(decode.trades.0, [0xca, 0xfe]);
        assert!(decode.interactions.0.is_empty());
        assert_eq!(decode.interaction_count, Some(2));
    }

    #[test]
    fn settlement_file_conflicts_with_blobs() {
        assert!(
            Args::try_parse_from([
                "settlement-tool",
                "decode",
                "--settlement",
                "settlement.json",
                "--trades",
                "0x00",
            ])
            .is_err()
        );
    }

    #[test]
    fn parses_uid() {
        let uid = format!("0x{}", "11".repeat(56));
        let args = Args::try_parse_from(["settlement-tool", "uid", uid.as_str()]).unwrap();
        assert!(matches!(args.command, Command::Uid { uid } if uid == OrderUid([0x11; 56])));
        assert!(Args::try_parse_from(["settlement-tool", "uid", "0x1111"]).is_err());
    }
}
