use std::fmt::{Display, Formatter};
use std::hash::Hasher;
use metrohash::MetroHash64;

pub struct FormatBinary
{
    pub bytes: f64
}
#[allow(non_upper_case_globals)]
impl FormatBinary
{
    pub const Ki: f64 = 1.0 * 1024.0; // Kibi (Ki)
    pub const Mi: f64 = Self::Ki * 1024.0; // Mebi (Mi)
    pub const Gi: f64 = Self::Mi * 1024.0; // Gibi (Gi)
}
impl Display for FormatBinary
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result
    {
        let div =
        {
            if self.bytes > Self::Gi
            {
                (self.bytes / Self::Gi, "Gi")
            }
            else if self.bytes > Self::Mi
            {
                (self.bytes / Self::Mi, "Mi")
            }
            else if self.bytes > Self::Ki
            {
                (self.bytes / Self::Ki, "Ki")
            }
            else
            {
                (self.bytes, "")
            }
        };
        Display::fmt(&div.0, f)?;
        if f.alternate() { f.write_str(" ")?; }
        f.write_str(div.1)
    }
}
#[macro_export]
macro_rules! format_binary
{
    ($val:expr) => { $crate::utils::FormatBinary { bytes: $val as f64 } };
}

// Content hash for built outputs. Stable across runs and platforms
pub fn hash_bytes(seed: u64, bytes: &[u8]) -> u64
{
    let mut hasher = MetroHash64::with_seed(seed);
    hasher.write(bytes);
    hasher.finish()
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn format_binary_values()
    {
        assert_eq!("123", format!("{}", format_binary!(123.0)));
        assert_eq!("123Ki", format!("{}", format_binary!(123.0 * FormatBinary::Ki)));
        assert_eq!("123Mi", format!("{}", format_binary!(123.0 * FormatBinary::Mi)));
        assert_eq!("3 Gi", format!("{:#}", format_binary!(3.0 * FormatBinary::Gi)));
    }

    #[test]
    fn format_binary_decimals()
    {
        assert_eq!("1.50Ki", format!("{:.2}", format_binary!(1536)));
    }

    #[test]
    fn hash_is_content_sensitive()
    {
        assert_eq!(hash_bytes(0, b"abc"), hash_bytes(0, b"abc"));
        assert_ne!(hash_bytes(0, b"abc"), hash_bytes(0, b"abd"));
        assert_ne!(hash_bytes(0, b"abc"), hash_bytes(1, b"abc"));
    }
}
