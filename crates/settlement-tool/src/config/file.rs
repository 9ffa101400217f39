use {
    crate::config,
    alloy::primitives::Address,
    anyhow::{Context, Result},
    serde::Deserialize,
    settlement_encoding::{
        DomainFields,
        DomainSeparator,
        domain::{DEFAULT_NAME, DEFAULT_VERSION},
    },
    std::path::Path,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct Config {
    /// The chain the settlement contract is deployed on.
    chain_id: u64,

    /// The settlement contract verifying order signatures.
    #[serde(default = "default_verifying_contract")]
    verifying_contract: Address,

    /// The EIP-712 domain name.
    #[serde(default = "default_name")]
    name: String,

    /// The EIP-712 domain version.
    #[serde(default = "default_version")]
    version: String,

    /// Use this domain separator instead of the one computed from the other
    /// fields.
    domain_separator: Option<DomainSeparator>,
}

fn default_verifying_contract() -> Address {
    config::SETTLEMENT_CONTRACT
}

fn default_name() -> String {
    DEFAULT_NAME.to_string()
}

fn default_version() -> String {
    DEFAULT_VERSION.to_string()
}

/// Load the domain configuration from a TOML file.
pub fn load(path: &Path) -> Result<config::Config> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("I/O error while reading {path:?}"))?;
    parse(&data).with_context(|| format!("invalid configuration in {path:?}"))
}

fn parse(data: &str) -> Result<config::Config> {
    let file: Config = toml::de::from_str(data).context("TOML syntax error")?;
    let mut config = config::Config::new(DomainFields {
        name: file.name,
        version: file.version,
        chain_id: file.chain_id,
        verifying_contract: file.verifying_contract,
    });
    if let Some(domain_separator) = file.domain_separator {
        if domain_separator != config.domain_separator {
            tracing::warn!(
                configured = %domain_separator,
                computed = %config.domain_separator,
                "domain separator override does not match the configured domain"
            );
        }
        config.domain_separator = domain_separator;
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use {super::*, std::io::Write};

    #[test]
    fn minimal_config() {
        let config = parse("chain-id = 1").unwrap();
        assert_eq!(config, config::Config::default());
        assert_eq!(
            config.domain_separator.to_string(),
            "0xc078f884a2676e1345748b1feace7b0abee5d00ecadb6e574dcdd109a63e8943"
        );
    }

    #[test]
    fn full_config() {
        let config = parse(
            r#"
            chain-id = 100
            verifying-contract = "0x1111111111111111111111111111111111111111"
            name = "Other Protocol"
            version = "v3"
            "#,
        )
        .unwrap();
        assert_eq!(
            config.domain,
            DomainFields {
                name: "Other Protocol".to_string(),
                version: "v3".to_string(),
                chain_id: 100,
                verifying_contract: Address::repeat_byte(0x11),
            }
        );
        assert_eq!(
            config.domain_separator,
            DomainSeparator::new(&config.domain)
        );
    }

    #[test]
    fn domain_separator_override() {
        let config = parse(
            r#"
            chain-id = 5
            domain-separator = "0x4242424242424242424242424242424242424242424242424242424242424242"
            "#,
        )
        .unwrap();
        assert_eq!(config.domain.chain_id, 5);
        assert_eq!(config.domain_separator, DomainSeparator([0x42; 32]));
    }

    #[test]
    fn rejects_invalid_config() {
        assert!(parse("").is_err());
        assert!(parse("chain-id = 1\nunknown-field = true").is_err());
        assert!(parse("chain-id = 1\nverifying-contract = \"0x11\"").is_err());
    }

    #[test]
    fn loads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "chain-id = 1").unwrap();
        assert_eq!(load(file.path()).unwrap(), config::Config::default());
        assert!(load(Path::new("/does/not/exist.toml")).is_err());
    }
}
