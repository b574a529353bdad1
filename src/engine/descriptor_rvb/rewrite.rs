use crate::wire::{Descriptor, ParseError};
use prost::encoding::WireType;
use serde::{Deserialize, Serialize};

// What to do when a path field doesn't end with the extension a rule expects
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuffixMismatch
{
    #[default]
    Keep, // leave the value as-is
    Reject, // fail the compile
}

// Redirect a string field from a source extension to its compiled extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewriteRule
{
    pub field: &'static str,
    pub number: u32,
    pub from_ext: &'static str,
    pub to_ext: &'static str,
}
impl RewriteRule
{
    // Rewrite every record of this rule's field, returns how many were changed.
    // A missing field is not an error
    pub fn apply(&self, descriptor: &mut Descriptor, on_mismatch: SuffixMismatch) -> Result<usize, ParseError>
    {
        let mut rewritten = 0;
        for field in descriptor.fields_numbered_mut(self.number)
        {
            if field.wire_type() != WireType::LengthDelimited
            {
                return Err(ParseError::WrongWireType { field: self.field, number: self.number, found: field.wire_type() });
            }

            let (value, replaced) =
            {
                let value = std::str::from_utf8(field.payload())
                    .map_err(|error| ParseError::InvalidUtf8 { field: self.field, error })?;
                (value.to_string(), replace_ext(value, self.from_ext, self.to_ext))
            };

            match (replaced, on_mismatch)
            {
                (Some(new_value), _) =>
                {
                    log::trace!("{}: {value:?} -> {new_value:?}", self.field);
                    field.set_payload(new_value.into_bytes());
                    rewritten += 1;
                }
                (None, SuffixMismatch::Keep) =>
                {
                    log::debug!("{}: {value:?} does not end with {:?}, leaving unchanged", self.field, self.from_ext);
                }
                (None, SuffixMismatch::Reject) =>
                {
                    return Err(ParseError::UnexpectedExtension { field: self.field, value, expected: self.from_ext });
                }
            }
        }
        Ok(rewritten)
    }
}

// Swap the trailing extension `from` for `to`. Exact, case-sensitive match. Returns None if `path` doesn't end with `from`
#[must_use]
pub fn replace_ext(path: &str, from: &str, to: &str) -> Option<String>
{
    path.strip_suffix(from).map(|stem| format!("{stem}{to}"))
}
