//! Shared member-loading helper for `INCLUDE` and library-resolved
//! procedure expansion (§4.1, §4.6).

use crate::resolve::LibraryResolver;

/// Resolve `member` against `libs` and read its content. Both resolver
/// modes produce a path string; reading it is always attempted the same
/// way, since native-PDS access is out of scope for this host environment
/// (Design Notes §9) and simply surfaces as an I/O error here.
pub fn load_member(resolver: &dyn LibraryResolver, member: &str, libs: &[String]) -> std::io::Result<String> {
    let resolved = resolver.resolve(member, libs).ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::NotFound, format!("unresolvable member {member}"))
    })?;
    std::fs::read_to_string(&resolved.path)
}
