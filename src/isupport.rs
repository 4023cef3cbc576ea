//! ISUPPORT (RPL_ISUPPORT) capability registry.
//!
//! Accumulates `KEY` / `KEY=VALUE` tokens from one or more 005 replies and
//! exposes typed views over the raw table. On key collision the most
//! recently advertised value wins; keys absent from a later batch are
//! retained. Typed views are recomputed from the raw table on each access.

use std::collections::HashMap;
use std::str::FromStr;

use tracing::warn;

use crate::error::CapValueError;

/// Sentinel for `LETTERS:` entries that advertise no limit.
pub const UNLIMITED: u32 = u32::MAX;

/// Accumulated server capability table with typed accessors.
#[derive(Clone, Debug, Default)]
pub struct Isupport {
    table: HashMap<String, String>,
}

impl Isupport {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge raw advertisement tokens into the table.
    ///
    /// Each token is `KEY` (flag, stored as an empty value) or `KEY=VALUE`.
    /// Last write wins on collision.
    pub fn append<I, S>(&mut self, tokens: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for token in tokens {
            let token = token.as_ref();
            if token.is_empty() {
                continue;
            }
            match token.split_once('=') {
                Some((key, value)) => self.table.insert(key.to_owned(), value.to_owned()),
                None => self.table.insert(token.to_owned(), String::new()),
            };
        }
    }

    /// Merge from a full 005 parameter list.
    ///
    /// Skips the leading parameter (own nickname echo) and the final one
    /// (human-readable trailer).
    pub fn append_from_params(&mut self, params: &[String]) {
        if params.len() < 2 {
            return;
        }
        self.append(params[1..params.len() - 1].iter().map(String::as_str));
    }

    /// Whether any advertisement has been received yet.
    pub fn received_info(&self) -> bool {
        !self.table.is_empty()
    }

    /// All advertised capability keys.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.table.keys().map(String::as_str)
    }

    /// The raw value for a key. An empty string means the key was
    /// advertised as a bare flag.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.table.get(key).map(String::as_str)
    }

    /// Whether a key was advertised at all, regardless of value.
    pub fn has(&self, key: &str) -> bool {
        self.table.contains_key(key)
    }

    /// Parse the value for `key` into a target type.
    ///
    /// Returns `Ok(None)` when the key is absent; a conversion failure is a
    /// [`CapValueError`], never a panic.
    pub fn get_parsed<T: FromStr>(&self, key: &str) -> Result<Option<T>, CapValueError> {
        match self.get(key) {
            None => Ok(None),
            Some(raw) => raw.parse().map(Some).map_err(|_| CapValueError {
                key: key.to_owned(),
                value: raw.to_owned(),
                wanted: std::any::type_name::<T>(),
            }),
        }
    }

    fn number(&self, key: &str) -> Option<u32> {
        match self.get_parsed::<u32>(key) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "ignoring malformed ISUPPORT value");
                None
            }
        }
    }

    fn grouped(&self, key: &str) -> Option<ModeLimits> {
        let raw = self.get(key)?;
        match ModeLimits::parse(raw) {
            Some(v) => Some(v),
            None => {
                warn!(key, value = raw, "ignoring malformed ISUPPORT limit group");
                None
            }
        }
    }

    /// The IRC network name (`NETWORK`).
    pub fn network(&self) -> Option<&str> {
        self.get("NETWORK")
    }

    /// Supported channel name prefixes (`CHANTYPES`).
    pub fn chantypes(&self) -> Option<Vec<char>> {
        self.get("CHANTYPES").map(|v| v.chars().collect())
    }

    /// Case mapping used for nick and channel comparison (`CASEMAPPING`).
    pub fn casemapping(&self) -> Option<&str> {
        self.get("CASEMAPPING")
    }

    /// Maximum number of parameterized modes per MODE command (`MODES`).
    pub fn modes(&self) -> Option<u32> {
        self.number("MODES")
    }

    /// Maximum nickname length (`NICKLEN`).
    pub fn nick_len(&self) -> Option<u32> {
        self.number("NICKLEN")
    }

    /// Maximum topic length (`TOPICLEN`).
    pub fn topic_len(&self) -> Option<u32> {
        self.number("TOPICLEN")
    }

    /// Maximum kick reason length (`KICKLEN`).
    pub fn kick_len(&self) -> Option<u32> {
        self.number("KICKLEN")
    }

    /// Maximum channel name length (`CHANNELLEN`).
    pub fn channel_len(&self) -> Option<u32> {
        self.number("CHANNELLEN")
    }

    /// Maximum away message length (`AWAYLEN`).
    pub fn away_len(&self) -> Option<u32> {
        self.number("AWAYLEN")
    }

    /// LIST extension tokens (`ELIST`).
    pub fn list_extensions(&self) -> Option<Vec<char>> {
        self.get("ELIST").map(|v| v.chars().collect())
    }

    /// Extra commands the server suggests clients use (`CMDS`).
    pub fn commands(&self) -> Option<Vec<String>> {
        self.get("CMDS")
            .map(|v| v.split(',').map(str::to_owned).collect())
    }

    /// Prefix mode to symbol mapping (`PREFIX`), e.g. `(ov)@+`.
    pub fn prefixes(&self) -> Option<PrefixMap> {
        let raw = self.get("PREFIX")?;
        match PrefixMap::parse(raw) {
            Some(v) => Some(v),
            None => {
                warn!(value = raw, "ignoring malformed ISUPPORT PREFIX");
                None
            }
        }
    }

    /// Four-way channel mode grouping (`CHANMODES`).
    pub fn chanmodes(&self) -> Option<ChanModes> {
        let raw = self.get("CHANMODES")?;
        match ChanModes::parse(raw) {
            Some(v) => Some(v),
            None => {
                warn!(value = raw, "ignoring malformed ISUPPORT CHANMODES");
                None
            }
        }
    }

    /// Maximum list-mode entries per mode letter (`MAXLIST`).
    pub fn max_list(&self) -> Option<ModeLimits> {
        self.grouped("MAXLIST")
    }

    /// Maximum joined channels per channel prefix (`CHANLIMIT`).
    pub fn chan_limit(&self) -> Option<ModeLimits> {
        self.grouped("CHANLIMIT")
    }

    /// ID length for channels with an ID, per channel type (`IDCHAN`).
    pub fn id_chan_len(&self) -> Option<ModeLimits> {
        self.grouped("IDCHAN")
    }

    /// Maximum targets per command (`TARGMAX`).
    pub fn targmax(&self) -> Option<TargetLimits> {
        let raw = self.get("TARGMAX")?;
        match TargetLimits::parse(raw) {
            Some(v) => Some(v),
            None => {
                warn!(value = raw, "ignoring malformed ISUPPORT TARGMAX");
                None
            }
        }
    }

    /// Whether the server supports ban exceptions (`EXCEPTS`).
    pub fn has_excepts(&self) -> bool {
        self.has("EXCEPTS")
    }

    /// Whether the server supports invite exceptions (`INVEX`).
    pub fn has_invex(&self) -> bool {
        self.has("INVEX")
    }

    /// Whether LIST output is flow-controlled server-side (`SAFELIST`).
    pub fn has_safelist(&self) -> bool {
        self.has("SAFELIST")
    }

    /// Whether the KNOCK command exists (`KNOCK`).
    pub fn has_knock(&self) -> bool {
        self.has("KNOCK")
    }

    /// Whether the CPRIVMSG command exists (`CPRIVMSG`).
    pub fn has_cprivmsg(&self) -> bool {
        self.has("CPRIVMSG")
    }

    /// Whether the CNOTICE command exists (`CNOTICE`).
    pub fn has_cnotice(&self) -> bool {
        self.has("CNOTICE")
    }

    /// Whether NAMES results carry full `nick!user@host` masks (`UHNAMES`).
    pub fn has_uhnames(&self) -> bool {
        self.has("UHNAMES")
    }

    /// Whether NAMES results may carry multiple prefixes (`NAMESX`).
    pub fn has_namesx(&self) -> bool {
        self.has("NAMESX")
    }

    /// Whether server-side ignores via user mode +g exist (`CALLERID`).
    pub fn has_callerid(&self) -> bool {
        self.has("CALLERID")
    }

    /// Whether the server may force nick changes (`FNC`).
    pub fn forced_nick_changes(&self) -> bool {
        self.has("FNC")
    }
}

/// Parsed `PREFIX` token: positional pairing of mode letters and symbols.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PrefixMap {
    entries: Vec<(char, char)>,
}

impl PrefixMap {
    /// Parse a `PREFIX` value like `(ov)@+`.
    pub fn parse(s: &str) -> Option<Self> {
        let rest = s.strip_prefix('(')?;
        let (modes, symbols) = rest.split_once(')')?;
        if modes.is_empty() || modes.chars().count() != symbols.chars().count() {
            return None;
        }
        Some(Self {
            entries: modes.chars().zip(symbols.chars()).collect(),
        })
    }

    /// The prefix symbol for a mode letter, e.g. `o` → `@`.
    pub fn symbol_for(&self, mode: char) -> Option<char> {
        self.entries
            .iter()
            .find(|(m, _)| *m == mode)
            .map(|(_, s)| *s)
    }

    /// The mode letter for a prefix symbol, e.g. `@` → `o`.
    pub fn mode_for(&self, symbol: char) -> Option<char> {
        self.entries
            .iter()
            .find(|(_, s)| *s == symbol)
            .map(|(m, _)| *m)
    }

    /// Iterate over all (mode, symbol) pairs in advertised order.
    pub fn iter(&self) -> impl Iterator<Item = (char, char)> + '_ {
        self.entries.iter().copied()
    }

    /// Number of prefix modes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no prefix modes were advertised.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parsed `CHANMODES` token: the four positional mode groups.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChanModes {
    /// Type A: list modes, parameter on both set and unset.
    pub a: String,
    /// Type B: modes that always take a parameter.
    pub b: String,
    /// Type C: modes that take a parameter only when set.
    pub c: String,
    /// Type D: modes that never take a parameter.
    pub d: String,
}

impl ChanModes {
    /// Parse a `CHANMODES` value like `eIbq,k,flj,CFLMPQScgimnprstz`.
    ///
    /// All four comma-separated groups must be present (groups may be
    /// empty strings).
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.splitn(4, ',');
        let (a, b, c, d) = (parts.next()?, parts.next()?, parts.next()?, parts.next()?);
        Some(ChanModes {
            a: a.to_owned(),
            b: b.to_owned(),
            c: c.to_owned(),
            d: d.to_owned(),
        })
    }
}

/// Grouped per-letter numeric limits (`MAXLIST`, `CHANLIMIT`, `IDCHAN`).
///
/// The grammar is a comma-separated list of `LETTERS:NUMBER`, where every
/// letter in a group maps to that group's number. `LETTERS:` with no number
/// means unlimited, represented as [`UNLIMITED`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ModeLimits {
    entries: Vec<(char, u32)>,
}

impl ModeLimits {
    /// Parse a grouped limit value like `bq:50,eI:`.
    pub fn parse(s: &str) -> Option<Self> {
        let mut entries: Vec<(char, u32)> = Vec::new();
        for part in s.split(',') {
            if part.is_empty() {
                continue;
            }
            let (letters, raw_limit) = part.split_once(':')?;
            let limit = if raw_limit.is_empty() {
                UNLIMITED
            } else {
                raw_limit.parse().ok()?
            };
            for ch in letters.chars() {
                entries.retain(|(c, _)| *c != ch);
                entries.push((ch, limit));
            }
        }
        Some(Self { entries })
    }

    /// The limit for a letter, if advertised.
    pub fn limit_for(&self, letter: char) -> Option<u32> {
        self.entries
            .iter()
            .find(|(c, _)| *c == letter)
            .map(|(_, n)| *n)
    }

    /// Iterate over all (letter, limit) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (char, u32)> + '_ {
        self.entries.iter().copied()
    }
}

/// Parsed `TARGMAX` token: per-command maximum target counts.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TargetLimits {
    entries: Vec<(String, u32)>,
}

impl TargetLimits {
    /// Parse a `TARGMAX` value like `PRIVMSG:4,NOTICE:4,JOIN:`.
    pub fn parse(s: &str) -> Option<Self> {
        let mut entries = Vec::new();
        for part in s.split(',') {
            if part.is_empty() {
                continue;
            }
            let (cmd, raw_limit) = part.split_once(':')?;
            if cmd.is_empty() {
                return None;
            }
            let limit = if raw_limit.is_empty() {
                UNLIMITED
            } else {
                raw_limit.parse().ok()?
            };
            entries.push((cmd.to_owned(), limit));
        }
        Some(Self { entries })
    }

    /// The target limit for a command name (case-insensitive).
    pub fn limit_for(&self, cmd: &str) -> Option<u32> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(cmd))
            .map(|(_, n)| *n)
    }

    /// Iterate over all (command, limit) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> + '_ {
        self.entries.iter().map(|(k, n)| (k.as_str(), *n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(tokens: &[&str]) -> Isupport {
        let mut info = Isupport::new();
        info.append(tokens.iter().copied());
        info
    }

    #[test]
    fn last_write_wins_and_unrelated_keys_retained() {
        let mut info = registry(&["CHANTYPES=#", "NETWORK=TestNet"]);
        info.append(["CHANTYPES=&#"]);
        assert_eq!(info.get("CHANTYPES"), Some("&#"));
        assert_eq!(info.network(), Some("TestNet"));
    }

    #[test]
    fn append_from_params_strips_nick_and_trailer() {
        let mut info = Isupport::new();
        let params: Vec<String> = ["mynick", "CHANTYPES=#", "PREFIX=(ov)@+", "are supported"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        info.append_from_params(&params);
        assert_eq!(info.chantypes(), Some(vec!['#']));
        assert!(!info.has("mynick"));
        assert!(!info.has("are supported"));
    }

    #[test]
    fn bare_flag_stored_as_empty_value() {
        let info = registry(&["EXCEPTS", "SAFELIST"]);
        assert!(info.has_excepts());
        assert!(info.has_safelist());
        assert!(!info.has_invex());
        assert_eq!(info.get("EXCEPTS"), Some(""));
    }

    #[test]
    fn prefix_map_pairing() {
        let map = PrefixMap::parse("(ov)@+").unwrap();
        assert_eq!(map.symbol_for('o'), Some('@'));
        assert_eq!(map.symbol_for('v'), Some('+'));
        assert_eq!(map.mode_for('@'), Some('o'));
        assert_eq!(map.symbol_for('x'), None);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn prefix_map_rejects_mismatched_lengths() {
        assert_eq!(PrefixMap::parse("(ov)@"), None);
        assert_eq!(PrefixMap::parse("ov@+"), None);
        assert_eq!(PrefixMap::parse("()"), None);
    }

    #[test]
    fn chanmodes_four_way_split() {
        let modes = ChanModes::parse("eIbq,k,flj,CFLMPQScgimnprstz").unwrap();
        assert_eq!(modes.a, "eIbq");
        assert_eq!(modes.b, "k");
        assert_eq!(modes.c, "flj");
        assert_eq!(modes.d, "CFLMPQScgimnprstz");

        assert_eq!(ChanModes::parse("a,b,c"), None);
    }

    #[test]
    fn maxlist_groups_with_unlimited() {
        let info = registry(&["MAXLIST=bq:50,eI:"]);
        let limits = info.max_list().unwrap();
        assert_eq!(limits.limit_for('b'), Some(50));
        assert_eq!(limits.limit_for('q'), Some(50));
        assert_eq!(limits.limit_for('e'), Some(UNLIMITED));
        assert_eq!(limits.limit_for('I'), Some(UNLIMITED));
        assert_eq!(limits.limit_for('z'), None);
    }

    #[test]
    fn chanlimit_groups() {
        let info = registry(&["CHANLIMIT=#&:25"]);
        let limits = info.chan_limit().unwrap();
        assert_eq!(limits.limit_for('#'), Some(25));
        assert_eq!(limits.limit_for('&'), Some(25));
    }

    #[test]
    fn targmax_by_command() {
        let info = registry(&["TARGMAX=PRIVMSG:4,NOTICE:4,JOIN:"]);
        let max = info.targmax().unwrap();
        assert_eq!(max.limit_for("PRIVMSG"), Some(4));
        assert_eq!(max.limit_for("privmsg"), Some(4));
        assert_eq!(max.limit_for("JOIN"), Some(UNLIMITED));
        assert_eq!(max.limit_for("KICK"), None);
    }

    #[test]
    fn scalar_lookup_failure_is_reported_not_fatal() {
        let info = registry(&["NICKLEN=not-a-number", "TOPICLEN=390"]);
        assert_eq!(info.nick_len(), None);
        assert_eq!(info.topic_len(), Some(390));

        let err = info.get_parsed::<u32>("NICKLEN").unwrap_err();
        assert_eq!(err.key, "NICKLEN");
        assert_eq!(err.value, "not-a-number");
    }

    #[test]
    fn missing_key_is_absent_not_error() {
        let info = Isupport::new();
        assert!(!info.received_info());
        assert_eq!(info.get_parsed::<u32>("MODES").unwrap(), None);
        assert_eq!(info.chantypes(), None);
        assert_eq!(info.prefixes(), None);
    }
}
