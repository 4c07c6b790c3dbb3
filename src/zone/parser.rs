use super::record::rdata_from_text;
use super::{Result, Zone, ZoneError};
use crate::dns::{DNSResourceClass, DNSResourceType};
use std::fs;
use std::path::Path;
use tracing::trace;

/// RFC 1035 master-file parser for fully-qualified (non-relativized) zones.
pub struct ZoneParser {
    origin: Option<String>,
    default_ttl: u32,
    last_name: Option<String>,
    line_number: usize,
}

impl ZoneParser {
    pub fn new() -> Self {
        Self {
            origin: None,
            default_ttl: super::constants::DEFAULT_TTL,
            last_name: None,
            line_number: 0,
        }
    }

    pub fn parse_file<P: AsRef<Path>>(&mut self, path: P) -> Result<Zone> {
        let contents =
            fs::read_to_string(path.as_ref()).map_err(|e| ZoneError::IoError(e.to_string()))?;
        self.parse(&contents)
    }

    pub fn parse(&mut self, contents: &str) -> Result<Zone> {
        self.line_number = 0;
        let mut zone: Option<Zone> = None;
        let mut pending = String::new();
        let mut paren_depth: i32 = 0;

        for raw_line in contents.lines() {
            self.line_number += 1;
            let line = strip_comment(raw_line);

            paren_depth += line.matches('(').count() as i32;
            paren_depth -= line.matches(')').count() as i32;
            if paren_depth < 0 {
                return Err(self.error("unbalanced parentheses"));
            }

            pending.push_str(&line.replace(['(', ')'], " "));
            if paren_depth > 0 {
                pending.push(' ');
                continue;
            }

            let statement = std::mem::take(&mut pending);
            let leading_blank = statement.starts_with([' ', '\t']);
            let trimmed = statement.trim();
            if trimmed.is_empty() {
                continue;
            }

            trace!(line = self.line_number, "parsing {}", trimmed);

            if let Some(rest) = trimmed.strip_prefix("$ORIGIN") {
                let origin = rest.trim().trim_end_matches('.').to_lowercase();
                if origin.is_empty() {
                    return Err(self.error("$ORIGIN needs a name"));
                }
                self.origin = Some(origin.clone());
                if zone.is_none() {
                    zone = Some(Zone::new(origin));
                }
                continue;
            }
            if let Some(rest) = trimmed.strip_prefix("$TTL") {
                self.default_ttl = rest
                    .trim()
                    .parse()
                    .map_err(|_| self.error("$TTL needs a number"))?;
                continue;
            }
            if trimmed.starts_with('$') {
                return Err(self.error(&format!("unknown directive: {}", trimmed)));
            }

            let zone_ref = zone
                .as_mut()
                .ok_or_else(|| self.error("record before $ORIGIN"))?;
            self.parse_record(trimmed, leading_blank, zone_ref)?;
        }

        if paren_depth != 0 {
            return Err(self.error("unclosed parentheses"));
        }

        zone.ok_or_else(|| ZoneError::ParseError("zone file has no $ORIGIN".to_string()))
    }

    fn parse_record(&mut self, line: &str, leading_blank: bool, zone: &mut Zone) -> Result<()> {
        let mut tokens = line.split_whitespace();

        let name = if leading_blank {
            self.last_name
                .clone()
                .ok_or_else(|| self.error("record inherits a name but none seen yet"))?
        } else {
            let token = tokens.next().ok_or_else(|| self.error("empty record"))?;
            self.resolve_name(token)?
        };
        self.last_name = Some(name.clone());

        // Optional TTL and class, in either order, before the type.
        let mut ttl = self.default_ttl;
        let mut class = DNSResourceClass::IN;
        let rtype = loop {
            let token = tokens
                .next()
                .ok_or_else(|| self.error("record has no type"))?;
            if let Ok(value) = token.parse::<u32>() {
                ttl = value;
            } else if let Some(parsed) = DNSResourceClass::from_mnemonic(token) {
                class = parsed;
            } else if let Some(parsed) = DNSResourceType::from_mnemonic(token) {
                break parsed;
            } else {
                return Err(self.error(&format!("unrecognized field: {}", token)));
            }
        };

        let rdata_text = tokens.collect::<Vec<_>>().join(" ");
        if rdata_text.is_empty() {
            return Err(self.error("record has no rdata"));
        }

        let covers = if rtype == DNSResourceType::RRSIG {
            let mnemonic = rdata_text
                .split_whitespace()
                .next()
                .ok_or_else(|| self.error("RRSIG has no covered type"))?;
            Some(
                DNSResourceType::from_mnemonic(mnemonic)
                    .ok_or_else(|| self.error(&format!("bad RRSIG covered type: {}", mnemonic)))?,
            )
        } else {
            None
        };

        let rdata = rdata_from_text(rtype, &rdata_text)
            .map_err(|e| self.error(&e.to_string()))?;
        zone.upsert(&name, class, rtype, covers, ttl, [rdata]);
        Ok(())
    }

    fn resolve_name(&self, token: &str) -> Result<String> {
        let origin = self
            .origin
            .as_ref()
            .ok_or_else(|| self.error("name before $ORIGIN"))?;
        Ok(match token {
            "@" => origin.clone(),
            _ if token.ends_with('.') => token.trim_end_matches('.').to_lowercase(),
            _ => format!("{}.{}", token.to_lowercase(), origin),
        })
    }

    fn error(&self, message: &str) -> ZoneError {
        ZoneError::ParseError(format!("line {}: {}", self.line_number, message))
    }
}

impl Default for ZoneParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Strip a `;` comment, ignoring semicolons inside quoted strings.
fn strip_comment(line: &str) -> String {
    let mut in_quotes = false;
    let mut out = String::with_capacity(line.len());
    for ch in line.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                out.push(ch);
            }
            ';' if !in_quotes => break,
            _ => out.push(ch),
        }
    }
    out
}
