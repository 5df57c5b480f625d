/// MD5 hex digest of the parts joined without a separator.
///
/// Used as the dedup key stored in the `hash` field, so callers must only pass
/// identity fields (never timestamps or queue positions).
pub fn hashit<S: AsRef<str>>(parts: &[S]) -> String {
    let mut context = md5::Context::new();
    for part in parts {
        context.consume(part.as_ref().as_bytes());
    }
    format!("{:x}", context.compute())
}
