use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStyle {
    Client,
    Server,
}

impl Default for GenerationStyle {
    fn default() -> Self {
        GenerationStyle::Client
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImportOptions {
    /// Importer to use for every binding; `None` picks the first one that
    /// supports each binding.
    pub protocol: Option<String>,
    pub module: String,
    pub style: GenerationStyle,
    pub generate_async: bool,
    pub reserved_names: Vec<String>,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            protocol: None,
            module: "services".into(),
            style: GenerationStyle::default(),
            generate_async: false,
            reserved_names: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReflectOptions {
    pub protocols: Vec<String>,
}

impl Default for ReflectOptions {
    fn default() -> Self {
        Self {
            protocols: vec!["Soap".into()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_take_defaults() {
        let options: ImportOptions = toml::from_str("generate_async = true").expect("options");

        assert_eq!(options.module, "services");
        assert_eq!(options.protocol, None);
        assert_eq!(options.style, GenerationStyle::Client);
        assert!(options.generate_async);

        let options: ReflectOptions = toml::from_str("").expect("options");
        assert_eq!(options.protocols, vec!["Soap".to_owned()]);
    }
}
