use {
    crate::{
        cli::{self, Command},
        config,
        dto,
    },
    anyhow::{Context, Result},
    clap::Parser,
    settlement_encoding::{EncodedSettlement, interaction},
};

/// Runs the settlement tool with the specified command line arguments and
/// prints the result as JSON.
pub fn run(args: impl Iterator<Item = String>) -> Result<()> {
    let args = cli::Args::parse_from(args);
    let obs_config = observe::Config::new(
        &args.log_filter,
        args.log_stderr_threshold,
        args.use_json_logs,
    );
    observe::tracing::initialize(&obs_config);
    tracing::debug!("running settlement-tool with arguments:\n{args:#?}");

    let config = match &args.config {
        Some(path) => config::load(path)?,
        None => config::Config::default(),
    };
    tracing::info!(domain_separator = %config.domain_separator, "loaded domain");

    let output = execute(&config, args.command)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn execute(config: &config::Config, command: Command) -> Result<serde_json::Value> {
    let output = match command {
        Command::Decode(decode) => {
            let settlement = encoded_settlement(decode)?;
            let decoded = settlement
                .decode(&config.domain_separator)
                .context("invalid settlement")?;
            serde_json::to_value(dto::Settlement::new(&decoded))?
        }
        Command::Uid { uid } => serde_json::to_value(dto::Uid::from(&uid))?,
        Command::Domain => serde_json::to_value(dto::Domain::new(
            &config.domain,
            config.domain_separator,
        ))?,
    };
    Ok(output)
}

fn encoded_settlement(decode: cli::Decode) -> Result<EncodedSettlement> {
    if let Some(path) = decode.settlement {
        let data = std::fs::read_to_string(&path)
            .with_context(|| format!("I/O error while reading {path:?}"))?;
        return serde_json::from_str(&data)
            .with_context(|| format!("invalid encoded settlement in {path:?}"));
    }

    let interactions = decode.interactions.0;
    let interaction_count = decode
        .interaction_count
        .unwrap_or(interactions.len() / interaction::HEADER_LEN);
    Ok(EncodedSettlement {
        tokens: decode.tokens,
        trades: decode.trades.0,
        interactions,
        interaction_count,
    })
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        alloy::{
            primitives::{Address, B256, U256},
            signers::local::PrivateKeySigner,
        },
        serde_json::json,
        settlement_encoding::{
            EcdsaSignature,
            InteractionData,
            OrderData,
            OrderUid,
            SettlementEncoder,
            SigningScheme,
        },
        std::io::Write,
    };

    fn signed_settlement(config: &config::Config) -> (EncodedSettlement, Address) {
        let signer = PrivateKeySigner::from_bytes(&B256::repeat_byte(0x42)).unwrap();
        let order = OrderData {
            sell_token: Address::repeat_byte(0x01),
            buy_token: Address::repeat_byte(0x02),
            sell_amount: U256::from(100),
            buy_amount: U256::from(99),
            valid_to: 1_000,
            ..Default::default()
        };
        let signature = EcdsaSignature::sign(
            SigningScheme::EthSign,
            &config.domain_separator,
            &order.hash_struct(),
            &signer,
        )
        .unwrap()
        .to_signature(SigningScheme::EthSign);

        let mut encoder = SettlementEncoder::new([order.sell_token, order.buy_token]).unwrap();
        encoder
            .add_trade(order, signature, order.sell_amount, 0)
            .unwrap();
        encoder.add_interaction(InteractionData {
            target: Address::repeat_byte(0x03),
            call_data: vec![0x01, 0x02],
        });
        (encoder.encode().unwrap(), signer.address())
    }

    #[test]
    fn decodes_settlement_arguments() {
        let config = config::Config::default();
        let (settlement, owner) = signed_settlement(&config);
        let output = execute(
            &config,
            Command::Decode(cli::Decode {
                settlement: None,
                tokens: settlement.tokens.clone(),
                trades: cli::Bytes(settlement.trades.clone()),
                interactions: cli::Bytes(settlement.interactions.clone()),
                interaction_count: None,
            }),
        )
        .unwrap();

        let trade = &output["trades"][0];
        assert_eq!(trade["owner"], json!(owner));
        assert_eq!(trade["signingScheme"], "ethsign");
        assert_eq!(trade["sellAmount"], "0x64");
        let uid: OrderUid = serde_json::from_value(trade["uid"].clone()).unwrap();
        assert_eq!(uid.parts().1, owner);
        assert_eq!(
            output["interactions"],
            json!([{
                "target": "0x0303030303030303030303030303030303030303",
                "callData": "0x0102",
            }])
        );
    }

    #[test]
    fn decodes_settlement_file() {
        let config = config::Config::default();
        let (settlement, owner) = signed_settlement(&config);
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", serde_json::to_string(&settlement).unwrap()).unwrap();

        let output = execute(
            &config,
            Command::Decode(cli::Decode {
                settlement: Some(file.path().to_path_buf()),
                tokens: Vec::new(),
                trades: Default::default(),
                interactions: Default::default(),
                interaction_count: None,
            }),
        )
        .unwrap();
        assert_eq!(output["trades"][0]["owner"], json!(owner));
    }

    #[test]
    fn rejects_settlement_from_other_domain() {
        let (settlement, owner) = signed_settlement(&config::Config::default());
        let other = config::Config::new(settlement_encoding::DomainFields::gpv2(
            100,
            config::SETTLEMENT_CONTRACT,
        ));
        let decoded = execute(
            &other,
            Command::Decode(cli::Decode {
                settlement: None,
                tokens: settlement.tokens.clone(),
                trades: cli::Bytes(settlement.trades.clone()),
                interactions: Default::default(),
                interaction_count: None,
            }),
        );
        // A different domain recovers a different owner.
        match decoded {
            Ok(output) => assert_ne!(output["trades"][0]["owner"], json!(owner)),
            Err(err) => assert!(format!("{err:#}").contains("invalid settlement")),
        }
    }

    #[test]
    fn splits_uid() {
        let uid = OrderUid::from_parts(B256::repeat_byte(0x11), Address::repeat_byte(0x22), 3);
        let output = execute(&config::Config::default(), Command::Uid { uid }).unwrap();
        assert_eq!(
            output,
            json!({
                "digest": "0x1111111111111111111111111111111111111111111111111111111111111111",
                "owner": "0x2222222222222222222222222222222222222222",
                "validTo": 3,
            })
        );
    }

    #[test]
    fn prints_domain() {
        let output = execute(&config::Config::default(), Command::Domain).unwrap();
        assert_eq!(
            output,
            json!({
                "name": "Gnosis Protocol",
                "version": "v2",
                "chainId": 1,
                "verifyingContract": "0x9008d19f58aabd9ed0d60971565aa8510560ab41",
                "domainSeparator": "0xc078f884a2676e1345748b1feace7b0abee5d00ecadb6e574dcdd109a63e8943",
            })
        );
    }
}
