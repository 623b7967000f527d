//! presets.rs - Built-in detector definitions for the Basic and Full tiers.
//!
//! Patterns that capture group 1 only redact that group; the rest of the match
//! is context and stays visible (`password=[REDACTED]`, `mysql://[REDACTED]`).
//! Value classes exclude `[` so an existing `[REDACTED]` never matches again.
//!
//! Phone detectors only fire on phone-shaped input: an explicit country prefix,
//! separators, or a preceding phone keyword. A bare run of digits such as an
//! order id is deliberately left alone.
//!
//! License: MIT OR APACHE 2.0

use crate::validators::{
    is_valid_credit_card_programmatically, is_valid_ssn_programmatically,
    is_valid_uk_nino_programmatically,
};

/// Static description of a built-in pattern.
#[derive(Debug, Clone, Copy)]
pub struct PresetDef {
    pub name: &'static str,
    pub pattern: &'static str,
    pub validator: Option<fn(&str) -> bool>,
}

const fn def(name: &'static str, pattern: &'static str) -> PresetDef {
    PresetDef { name, pattern, validator: None }
}

const fn validated(name: &'static str, pattern: &'static str, validator: fn(&str) -> bool) -> PresetDef {
    PresetDef { name, pattern, validator: Some(validator) }
}

pub const BASIC: &[PresetDef] = &[
    // Card numbers and national identifiers
    validated("credit_card", r"\b(?:\d[ -]?){12,18}\d\b", is_valid_credit_card_programmatically),
    validated("us_ssn", r"\b\d{3}-\d{2}-\d{4}\b", is_valid_ssn_programmatically),

    // Credential assignments
    def(
        "password_assignment",
        r#"(?i)\b[a-z_]*(?:password|passwd|pwd|passphrase)["']?\s*[:=]\s*["']?([^\s"',;&\[\]{}]+)"#,
    ),
    def(
        "secret_assignment",
        r#"(?i)\b[a-z_]*(?:secret|token)["']?\s*[:=]\s*["']?([^\s"',;&\[\]{}]+)"#,
    ),
    def(
        "api_key_assignment",
        r#"(?i)\b[a-z_]*(?:api[_-]?key|access[_-]?key)["']?\s*[:=]\s*["']?([^\s"',;&\[\]{}]+)"#,
    ),
    def(
        "authorization_header",
        r#"(?i)\bauthorization["']?\s*[:=]\s*["']?((?:basic|bearer|token|digest)\s+[^\s"',;\[\]{}]+|[^\s"',;\[\]{}]+)"#,
    ),
    def("openai_key", r"\bsk-(?:proj-)?[A-Za-z0-9_-]{20,}"),
    def(
        "private_key_block",
        r"(?s)-----BEGIN [A-Z ]*PRIVATE KEY-----.*?(?:-----END [A-Z ]*PRIVATE KEY-----|$)",
    ),

    // Phone numbers
    def(
        "phone_with_keyword",
        r#"(?i)\b(?:phone|mobile|tel|cell|telephone)(?:[_ -]?(?:no|num|number))?["']?\s*[:=]?\s*["']?(\+?\d[\d\s().-]{6,18}\d)"#,
    ),
    def("phone_us", r"(?:\+1[-. ]?)?\(?\b[2-9]\d{2}\)?[-. ]\d{3}[-. ]\d{4}\b"),
    def("phone_cn", r"\+86[- ]?1[3-9]\d{9}\b"),
    def("phone_uk", r"\+44[- ]?(?:\(0\)\s?)?\d{2,4}[- ]?\d{3,4}[- ]?\d{3,4}\b"),
    def("phone_de", r"\+49[- ]?\d{2,5}[- ]?\d{3,9}\b"),
    def("phone_fr", r"\+33[- ]?[1-9](?:[ .-]?\d{2}){4}\b"),
    def("phone_jp", r"\+81[- ]?\d{1,4}[- ]?\d{1,4}[- ]?\d{4}\b"),
    def("phone_in", r"\+91[- ]?[6-9]\d{4}[- ]?\d{5}\b"),
    def("phone_au", r"\+61[- ]?[2-478](?:[- ]?\d){8}\b"),
    def("phone_br", r"\+55[- ]?\(?\d{2}\)?[- ]?9?\d{4}[- ]?\d{4}\b"),
    def("phone_kr", r"\+82[- ]?1\d[- ]?\d{3,4}[- ]?\d{4}\b"),
    def("phone_ru", r"\+7[- ]?\(?\d{3}\)?[- ]?\d{3}[- ]?\d{2}[- ]?\d{2}\b"),

    // Database connection strings
    def(
        "database_url",
        r#"(?i)\b(?:mysql|mariadb|postgres(?:ql)?|mongodb(?:\+srv)?|rediss?|sqlite3?|cassandra|influxdb|clickhouse|amqp)://([^\s'"<>\[\]]+)"#,
    ),
    def(
        "jdbc_url",
        r#"(?i)\bjdbc:[a-z0-9]+(?::[a-z0-9]+)?:(?://)?([^/\s'"<>\[\]][^\s'"<>\[\]]*)(?:[\s'"<>\]]|$)"#,
    ),
    def(
        "sqlserver_credentials",
        r#"(?i)(?:^|;)\s*(?:user\s?id|uid|password|pwd)\s*=\s*([^;'"\s\[][^;'"]*)"#,
    ),
    def(
        "oracle_dsn",
        r#"(?i)\b([a-z0-9_]+/[^\s@/'"\[]+)@(?:\(DESCRIPTION|[a-z0-9._-]+(?::\d+)?[/:][a-z0-9_.]+)"#,
    ),
];

pub const FULL_EXTRA: &[PresetDef] = &[
    def("jwt", r"\beyJ[A-Za-z0-9_-]{5,}\.[A-Za-z0-9_-]{5,}\.[A-Za-z0-9_-]{5,}"),
    def("aws_access_key", r"\b(?:AKIA|ASIA|AGPA|AIDA|AROA|ANPA)[0-9A-Z]{16}\b"),
    def(
        "aws_secret_key",
        r#"(?i)\baws[_-]?secret[_-]?(?:access[_-]?)?key["']?\s*[:=]\s*["']?([A-Za-z0-9/+=]{40})"#,
    ),
    def("google_api_key", r"\bAIza[0-9A-Za-z_-]{35}"),
    def("google_oauth_token", r"\bya29\.[0-9A-Za-z_-]{20,}"),
    def("github_token", r"\bgh[pousr]_[A-Za-z0-9]{36,}"),
    def("slack_token", r"\bxox[baprs]-[A-Za-z0-9-]{10,}"),
    def("bearer_token", r"(?i)\bbearer\s+([A-Za-z0-9._~+/-]{16,}=*)"),
    def(
        "ipv4_address",
        r"\b(?:(?:25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)\.){3}(?:25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)\b",
    ),
    def(
        "url_credentials",
        r#"(?i)\b[a-z][a-z0-9+.-]*://([^\s:/@'"\[]+:[^\s@'"\[]+)@"#,
    ),
    def(
        "connection_string_host",
        r#"(?i)(?:^|;)\s*(?:server|data source|host|address)\s*=\s*([^;'"\s\[][^;'"]*)"#,
    ),
    validated(
        "uk_nino",
        r"(?i)\b[A-CEGHJ-PR-TW-Z]{2}\s?\d{2}\s?\d{2}\s?\d{2}\s?[A-D]\b",
        is_valid_uk_nino_programmatically,
    ),
];
