//! Boolean flag naming: single `--x` flags and `--x/--no-x` on/off pairs.
//!
//! Long names are stored without the leading `--`; [`BoolFlag::encode`]
//! adds it back. The off name is chosen in this order:
//!
//! 1. an explicit off name ([`OptionSpec::off_option`]),
//! 2. a per-field off prefix ([`OptionSpec::off_prefix`]),
//! 3. the schema-wide off prefix (`no` unless configured).
//!
//! If the computed off name would read as another field of the same schema
//! (`--no-cache` when the schema also has a `no_cache` field) the pairing is
//! dropped with a warning and the field falls back to a single flag.

use crate::field::OptionSpec;

/// The CLI shape of a boolean field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoolFlag {
    Single { on: String },
    Pair { on: String, off: String },
}

impl BoolFlag {
    pub fn on(&self) -> &str {
        match self {
            BoolFlag::Single { on } | BoolFlag::Pair { on, .. } => on,
        }
    }

    pub fn off(&self) -> Option<&str> {
        match self {
            BoolFlag::Single { .. } => None,
            BoolFlag::Pair { off, .. } => Some(off),
        }
    }

    pub fn is_pair(&self) -> bool {
        matches!(self, BoolFlag::Pair { .. })
    }

    /// The flag that expresses `value`, or `None` when a single flag is simply
    /// left off to mean `false`.
    pub fn encode(&self, value: bool) -> Option<String> {
        if value {
            return Some(format!("--{}", self.on()));
        }
        self.off().map(|off| format!("--{off}"))
    }

    /// Map one flag occurrence back to a boolean. Accepts names with or
    /// without the leading `--`.
    pub fn decode(&self, flag: &str) -> Option<bool> {
        let name = flag.strip_prefix("--").unwrap_or(flag);
        if name == self.on() {
            Some(true)
        } else if self.off() == Some(name) {
            Some(false)
        } else {
            None
        }
    }

    /// Decode a sequence of flag occurrences; the last recognised one wins.
    pub fn decode_last<'a>(&self, flags: impl IntoIterator<Item = &'a str>) -> Option<bool> {
        flags.into_iter().filter_map(|f| self.decode(f)).last()
    }
}

/// `snake_case` to the hyphenated long-flag form.
pub fn hyphenate(name: &str) -> String {
    name.replace('_', "-")
}

/// Compute the off flag name for a boolean field (without `--`).
pub fn off_flag_name(external_name: &str, spec: &OptionSpec, default_prefix: &str) -> String {
    if let Some(off) = &spec.flag_off_option {
        return off.trim_start_matches('-').to_string();
    }
    let prefix = spec.flag_off_prefix.as_deref().unwrap_or(default_prefix);
    format!("{prefix}-{}", hyphenate(external_name))
}

/// Decide the flag shape of a boolean field.
///
/// `is_field` reports whether a `snake_case` key names a field of the same
/// schema; it is consulted for the collision check.
pub fn bool_flag(
    field_name: &str,
    external_name: &str,
    spec: &OptionSpec,
    default_prefix: &str,
    is_field: impl Fn(&str) -> bool,
) -> BoolFlag {
    let on = hyphenate(external_name);
    if !spec.flag_enable_on_off {
        return BoolFlag::Single { on };
    }

    let off = off_flag_name(external_name, spec, default_prefix);
    let collision = off.replace('-', "_");
    if is_field(&collision) {
        tracing::warn!(
            "Boolean field '{field_name}' off-option '--{off}' collides with existing field \
             '{collision}'. Falling back to single flag. Set an explicit off option to customize."
        );
        return BoolFlag::Single { on };
    }

    BoolFlag::Pair { on, off }
}
