use crate::consts::{CODEPOINT_URI, ERR_NS, MAX_TZ_MINUTES, XQE_ERR_NS};
use crate::engine::collation::{Collation, CollationRegistry};
use crate::expr::{Var, VarId};
use crate::xdm::types::AtomicType;
use crate::xdm::{ExpandedName, XdmSequence};
use chrono::{FixedOffset, Offset};
use core::fmt;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use url::Url;

/// Error codes raised by the comparison engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    FORG0001, // invalid lexical form / casting failure
    FORG0002, // invalid argument to URI resolution
    FORG0006, // invalid argument type for effective boolean value
    FODT0003, // invalid timezone value
    FOCH0002, // collation does not exist
    XPTY0004, // type error (incomparable types, sequence where an item is expected)
    XPST0008, // undeclared variable
    XQE00001, // engine specific: evaluation cancelled
    Unknown,
}

impl ErrorCode {
    pub fn local(&self) -> &'static str {
        match self {
            ErrorCode::FORG0001 => "FORG0001",
            ErrorCode::FORG0002 => "FORG0002",
            ErrorCode::FORG0006 => "FORG0006",
            ErrorCode::FODT0003 => "FODT0003",
            ErrorCode::FOCH0002 => "FOCH0002",
            ErrorCode::XPTY0004 => "XPTY0004",
            ErrorCode::XPST0008 => "XPST0008",
            ErrorCode::XQE00001 => "XQE00001",
            ErrorCode::Unknown => "UNKNOWN",
        }
    }

    /// QName of the code; engine codes live in their own namespace.
    pub fn qname(&self) -> ExpandedName {
        let ns = match self {
            ErrorCode::XQE00001 => XQE_ERR_NS,
            _ => ERR_NS,
        };
        ExpandedName::new(Some(ns.to_string()), self.local())
    }

    pub fn from_code(s: &str) -> Self {
        use ErrorCode::*;
        match s {
            "err:FORG0001" => FORG0001,
            "err:FORG0002" => FORG0002,
            "err:FORG0006" => FORG0006,
            "err:FODT0003" => FODT0003,
            "err:FOCH0002" => FOCH0002,
            "err:XPTY0004" => XPTY0004,
            "err:XPST0008" => XPST0008,
            "xqe:XQE00001" => XQE00001,
            _ => Unknown,
        }
    }
}

/// Structured discriminator for the failures callers commonly branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    IncomparableTypes(AtomicType, AtomicType),
    SequenceTooLong,
    InvalidCast,
    InvalidTimezone,
    Cancelled,
    Other,
}

/// Source location of the expression that raised an error.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InputInfo {
    pub path: Option<String>,
    pub line: u32,
    pub column: u32,
}

impl InputInfo {
    pub fn new(line: u32, column: u32) -> Self {
        Self {
            path: None,
            line,
            column,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl fmt::Display for InputInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(p) => write!(f, "{p}:{}:{}", self.line, self.column),
            None => write!(f, "{}:{}", self.line, self.column),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub struct Error {
    pub code: ExpandedName,
    pub message: String,
    #[source]
    pub source: Option<Arc<dyn std::error::Error + Send + Sync>>,
    pub kind: ErrorKind,
    pub info: Option<InputInfo>,
}

impl Error {
    pub fn new_qname(code: ExpandedName, msg: impl Into<String>) -> Self {
        Self {
            code,
            message: msg.into(),
            source: None,
            kind: ErrorKind::Other,
            info: None,
        }
    }

    pub fn from_code(code: ErrorCode, msg: impl Into<String>) -> Self {
        Self::new_qname(code.qname(), msg)
    }

    fn with_kind(mut self, kind: ErrorKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn incomparable(left: AtomicType, right: AtomicType) -> Self {
        Self::from_code(
            ErrorCode::XPTY0004,
            format!("{left} and {right} cannot be compared"),
        )
        .with_kind(ErrorKind::IncomparableTypes(left, right))
    }

    pub fn sequence_too_long(found: usize) -> Self {
        Self::from_code(
            ErrorCode::XPTY0004,
            format!("item expected, sequence of {found} items found"),
        )
        .with_kind(ErrorKind::SequenceTooLong)
    }

    pub fn invalid_cast(target: AtomicType, lexical: &str) -> Self {
        Self::from_code(
            ErrorCode::FORG0001,
            format!("cannot cast \"{lexical}\" to {target}"),
        )
        .with_kind(ErrorKind::InvalidCast)
    }

    pub fn invalid_timezone(minutes: i32) -> Self {
        Self::from_code(
            ErrorCode::FODT0003,
            format!("timezone offset of {minutes} minutes is out of range"),
        )
        .with_kind(ErrorKind::InvalidTimezone)
    }

    pub fn cancelled() -> Self {
        Self::from_code(ErrorCode::XQE00001, "evaluation was cancelled").with_kind(ErrorKind::Cancelled)
    }

    pub fn unknown_collation(uri: &str) -> Self {
        Self::from_code(ErrorCode::FOCH0002, format!("unknown collation URI: {uri}"))
    }

    pub fn invalid_uri(uri: &str) -> Self {
        Self::from_code(ErrorCode::FORG0002, format!("invalid URI: {uri}"))
    }

    /// Attach a source location unless one is already present.
    pub fn with_info(mut self, info: Option<&InputInfo>) -> Self {
        if self.info.is_none() {
            self.info = info.cloned();
        }
        self
    }

    pub fn with_source(
        mut self,
        source: impl Into<Option<Arc<dyn std::error::Error + Send + Sync>>>,
    ) -> Self {
        self.source = source.into();
        self
    }

    pub fn code_enum(&self) -> ErrorCode {
        match self.code.ns_uri.as_deref() {
            Some(ERR_NS) => ErrorCode::from_code(&format!("err:{}", self.code.local)),
            Some(XQE_ERR_NS) => ErrorCode::from_code(&format!("xqe:{}", self.code.local)),
            _ => ErrorCode::Unknown,
        }
    }

    /// Format the code as `err:LOCAL`, `xqe:LOCAL` or `Q{ns}local`.
    pub fn format_code(&self) -> String {
        match self.code.ns_uri.as_deref() {
            Some(ERR_NS) => format!("err:{}", self.code.local),
            Some(XQE_ERR_NS) => format!("xqe:{}", self.code.local),
            Some(ns) => format!("Q{{{}}}{}", ns, self.code.local),
            None => self.code.local.clone(),
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Error::from_code(ErrorCode::FORG0002, e.to_string())
            .with_source(Some(Arc::new(e) as Arc<dyn std::error::Error + Send + Sync>))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error: {} ({})", self.message, self.format_code())?;
        if let Some(info) = &self.info {
            write!(f, " at {info}")?;
        }
        Ok(())
    }
}

/// Compile-time settings shared by every node of an expression tree.
#[derive(Clone)]
pub struct StaticContext {
    pub base_uri: Option<Url>,
    pub default_collation: Arc<dyn Collation>,
    pub collations: Arc<CollationRegistry>,
    pub implicit_timezone: FixedOffset,
}

impl StaticContext {
    /// Resolve a collation URI; `None` selects the default collation.
    pub fn collation(&self, uri: Option<&str>) -> Result<Arc<dyn Collation>, Error> {
        match uri {
            None => Ok(self.default_collation.clone()),
            Some(u) => self.collations.get(u).ok_or_else(|| Error::unknown_collation(u)),
        }
    }

    pub fn implicit_tz_minutes(&self) -> i32 {
        self.implicit_timezone.local_minus_utc() / 60
    }
}

impl Default for StaticContext {
    fn default() -> Self {
        let collations = Arc::new(CollationRegistry::default());
        let default_collation = collations
            .get(CODEPOINT_URI)
            .unwrap_or_else(|| Arc::new(crate::engine::collation::CodepointCollation));
        Self {
            base_uri: None,
            default_collation,
            collations,
            implicit_timezone: chrono::Utc.fix(),
        }
    }
}

impl fmt::Debug for StaticContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticContext")
            .field("base_uri", &self.base_uri.as_ref().map(Url::as_str))
            .field("default_collation", &self.default_collation.uri())
            .field("implicit_timezone", &self.implicit_timezone)
            .finish()
    }
}

/// Builder for [`StaticContext`]. Settings are validated in [`build`](Self::build).
#[derive(Default)]
pub struct StaticContextBuilder {
    base_uri: Option<String>,
    default_collation: Option<String>,
    extra_collations: Vec<Arc<dyn Collation>>,
    timezone_minutes: Option<i32>,
}

impl StaticContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_uri(mut self, uri: impl Into<String>) -> Self {
        self.base_uri = Some(uri.into());
        self
    }

    pub fn with_default_collation(mut self, uri: impl Into<String>) -> Self {
        self.default_collation = Some(uri.into());
        self
    }

    pub fn with_collation(mut self, collation: Arc<dyn Collation>) -> Self {
        self.extra_collations.push(collation);
        self
    }

    pub fn with_timezone(mut self, offset_minutes: i32) -> Self {
        self.timezone_minutes = Some(offset_minutes);
        self
    }

    /// Use the offset of the host's local timezone as the implicit timezone.
    pub fn with_local_timezone(self) -> Self {
        let offset = chrono::Local::now().offset().fix();
        self.with_timezone(offset.local_minus_utc() / 60)
    }

    pub fn build(self) -> Result<StaticContext, Error> {
        let mut registry = CollationRegistry::default();
        for c in self.extra_collations {
            registry.insert(c);
        }
        let default_uri = self.default_collation.as_deref().unwrap_or(CODEPOINT_URI);
        let default_collation = registry
            .get(default_uri)
            .ok_or_else(|| Error::unknown_collation(default_uri))?;
        let base_uri = self.base_uri.as_deref().map(Url::parse).transpose()?;
        let minutes = self.timezone_minutes.unwrap_or(0);
        if minutes.unsigned_abs() > MAX_TZ_MINUTES.unsigned_abs() {
            return Err(Error::invalid_timezone(minutes));
        }
        let implicit_timezone =
            FixedOffset::east_opt(minutes * 60).ok_or_else(|| Error::invalid_timezone(minutes))?;
        Ok(StaticContext {
            base_uri,
            default_collation,
            collations: Arc::new(registry),
            implicit_timezone,
        })
    }
}

/// Per-evaluation state: variable bindings and the cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct QueryContext {
    variables: HashMap<VarId, XdmSequence>,
    cancelled: Arc<AtomicBool>,
}

impl QueryContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a value to a variable. The value must match the declared type.
    pub fn bind(&mut self, var: &Var, value: XdmSequence) -> Result<(), Error> {
        if !var.seq_type.matches(&value) {
            return Err(Error::from_code(
                ErrorCode::XPTY0004,
                format!(
                    "value of ${} does not match its declared type {}",
                    var.name, var.seq_type
                ),
            ));
        }
        self.variables.insert(var.id, value);
        Ok(())
    }

    pub fn variable(&self, var: &Var) -> Result<&XdmSequence, Error> {
        self.variables.get(&var.id).ok_or_else(|| {
            Error::from_code(ErrorCode::XPST0008, format!("variable ${} is not bound", var.name))
        })
    }

    /// Shared flag; storing `true` stops evaluation at the next check.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, AtomicOrdering::Relaxed);
    }

    pub fn check_stop(&self) -> Result<(), Error> {
        if self.cancelled.load(AtomicOrdering::Relaxed) {
            return Err(Error::cancelled());
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct QueryContextBuilder {
    bindings: Vec<(Var, XdmSequence)>,
    cancelled: Option<Arc<AtomicBool>>,
}

impl QueryContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_variable(mut self, var: &Var, value: impl Into<XdmSequence>) -> Self {
        self.bindings.push((var.clone(), value.into()));
        self
    }

    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancelled = Some(flag);
        self
    }

    pub fn build(self) -> Result<QueryContext, Error> {
        let mut qc = QueryContext {
            variables: HashMap::new(),
            cancelled: self.cancelled.unwrap_or_default(),
        };
        for (var, value) in self.bindings {
            qc.bind(&var, value)?;
        }
        Ok(qc)
    }
}
