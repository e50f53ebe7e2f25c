/// XML Schema namespace (`xs:` prefix).
pub const XS: &str = "http://www.w3.org/2001/XMLSchema";
/// W3C error namespace (`err:` prefix).
pub const ERR_NS: &str = "http://www.w3.org/2005/xqt-errors";
/// Namespace for engine-specific error codes.
pub const XQE_ERR_NS: &str = "urn:xqe:errors";
pub const XML_URI: &str = "http://www.w3.org/XML/1998/namespace";

pub const CODEPOINT_URI: &str = "http://www.w3.org/2005/xpath-functions/collation/codepoint";
pub const SIMPLE_CASE_URI: &str = "urn:xqe:collation:simple-case";
pub const SIMPLE_ACCENT_URI: &str = "urn:xqe:collation:simple-accent";
pub const SIMPLE_CASE_ACCENT_URI: &str = "urn:xqe:collation:simple-case-accent";

/// Largest timezone displacement allowed by XML Schema (14:00), in minutes.
pub const MAX_TZ_MINUTES: i32 = 14 * 60;
