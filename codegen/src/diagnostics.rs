use serde::Serialize;
use std::{
    fmt,
    ops::{BitOr, BitOrAssign},
};
use tracing::warn;

/// Closed set of warning categories raised while importing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Warnings(u8);

impl Warnings {
    pub const NONE: Warnings = Warnings(0);
    pub const NO_CODE_GENERATED: Warnings = Warnings(1);
    pub const OPTIONAL_EXTENSIONS_IGNORED: Warnings = Warnings(1 << 1);
    pub const REQUIRED_EXTENSIONS_IGNORED: Warnings = Warnings(1 << 2);
    pub const UNSUPPORTED_OPERATIONS_IGNORED: Warnings = Warnings(1 << 3);
    pub const UNSUPPORTED_BINDINGS_IGNORED: Warnings = Warnings(1 << 4);
    pub const NO_METHODS_GENERATED: Warnings = Warnings(1 << 5);

    const NAMES: [(Warnings, &'static str); 6] = [
        (Warnings::NO_CODE_GENERATED, "NoCodeGenerated"),
        (Warnings::OPTIONAL_EXTENSIONS_IGNORED, "OptionalExtensionsIgnored"),
        (Warnings::REQUIRED_EXTENSIONS_IGNORED, "RequiredExtensionsIgnored"),
        (Warnings::UNSUPPORTED_OPERATIONS_IGNORED, "UnsupportedOperationsIgnored"),
        (Warnings::UNSUPPORTED_BINDINGS_IGNORED, "UnsupportedBindingsIgnored"),
        (Warnings::NO_METHODS_GENERATED, "NoMethodsGenerated"),
    ];

    pub fn contains(self, other: Warnings) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Warnings) {
        self.0 |= other.0;
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn names(self) -> impl Iterator<Item = &'static str> {
        Self::NAMES
            .into_iter()
            .filter(move |(flag, _)| self.contains(*flag))
            .map(|(_, name)| name)
    }
}

impl BitOr for Warnings {
    type Output = Warnings;

    fn bitor(self, rhs: Warnings) -> Warnings {
        Warnings(self.0 | rhs.0)
    }
}

impl BitOrAssign for Warnings {
    fn bitor_assign(&mut self, rhs: Warnings) {
        self.insert(rhs)
    }
}

impl fmt::Display for Warnings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("None");
        }

        f.write_str(&self.names().collect::<Vec<_>>().join(", "))
    }
}

/// A recoverable refusal: the operation or binding is skipped, not the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unsupported {
    pub message: String,
}

impl Unsupported {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for Unsupported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub flag: Warnings,
    pub message: String,
}

/// Warning sink shared by the import driver and the protocol importers.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    flags: Warnings,
    warnings: Vec<Warning>,
}

impl Diagnostics {
    pub fn warn(&mut self, flag: Warnings, message: impl Into<String>) {
        let message = message.into();
        warn!(%flag, "{}", message);

        self.flags |= flag;
        self.warnings.push(Warning { flag, message });
    }

    pub fn flags(&self) -> Warnings {
        self.flags
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Takes over warnings already logged by another sink.
    pub fn append(&mut self, other: Diagnostics) {
        self.flags |= other.flags;
        self.warnings.extend(other.warnings);
    }

    pub fn into_parts(self) -> (Warnings, Vec<Warning>) {
        (self.flags, self.warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_accumulate() {
        let mut diagnostics = Diagnostics::default();
        diagnostics.warn(Warnings::UNSUPPORTED_OPERATIONS_IGNORED, "skipped");
        diagnostics.warn(Warnings::NO_METHODS_GENERATED, "empty");

        let flags = diagnostics.flags();
        assert!(flags.contains(Warnings::UNSUPPORTED_OPERATIONS_IGNORED));
        assert!(flags.contains(Warnings::NO_METHODS_GENERATED));
        assert!(!flags.contains(Warnings::NO_CODE_GENERATED));
        assert_eq!(
            flags.to_string(),
            "UnsupportedOperationsIgnored, NoMethodsGenerated"
        );
        assert_eq!(diagnostics.warnings().len(), 2);
    }
}
