use serde::{Deserialize, Serialize};

/// Options for one compile.
///
/// Every field has a default, so partial JSON such as `{}` or
/// `{"tolerateFaults": true}` loads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompileOptions {
    /// Log and skip malformed constructs instead of aborting the compile.
    pub tolerate_faults: bool,
}

impl CompileOptions {
    pub fn tolerant() -> Self {
        Self {
            tolerate_faults: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_intolerant() {
        assert!(!CompileOptions::default().tolerate_faults);
    }

    #[test]
    fn test_loads_from_partial_json() {
        let options: CompileOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, CompileOptions::default());

        let options: CompileOptions = serde_json::from_str(r#"{"tolerateFaults": true}"#).unwrap();
        assert_eq!(options, CompileOptions::tolerant());
    }
}
