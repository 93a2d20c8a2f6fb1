//! Mapping symbol locations back to the artifact file that holds them.
//!
//! Locations are URL strings. A symbol packaged inside an archive reports the
//! archive's URL followed by the boundary marker and the entry path
//! (`archive:file:///plugins/sample.zip!/sample/Main.wasm`); a symbol loaded from
//! anything else reports that thing's own URL (`file:///plugins/sample/`).

use std::path::PathBuf ;
use url::Url ;

/// Prefix marking a location nested inside an archive.
pub(crate) const ARCHIVE_SCHEME: &str = "archive:" ;
/// Separates the outer archive from the entry inside it.
pub(crate) const BOUNDARY: &str = "!/" ;
/// Suffix of a single packaged code unit.
pub(crate) const UNIT_SUFFIX: &str = ".wasm" ;

/// Resolves a symbol location to the single file that contains it.
///
/// Returns `None` when the location names a packaged unit with no unambiguous
/// archive boundary (a loose component file, or several markers), or when the
/// outer part is not a `file:` URL.
pub(crate) fn artifact_file( location: &str ) -> Option<PathBuf> {
    match location.ends_with( UNIT_SUFFIX ) {
        true => {
            let mut parts = location.split( BOUNDARY );
            let outer = parts.next()?;
            let _entry = parts.next()?;
            if parts.next().is_some() { return None }
            file_path( outer.strip_prefix( ARCHIVE_SCHEME ).unwrap_or( outer ))
        },
        false => file_path( location ),
    }
}

fn file_path( url: &str ) -> Option<PathBuf> {
    Url::parse( url ).ok()
        .filter(| url | url.scheme() == "file" )?
        .to_file_path().ok()
}

#[cfg( test )]
mod tests {
    use std::path::PathBuf ;
    use super::artifact_file ;

    #[test]
    fn nested_location_resolves_to_outer_archive() {
        assert_eq!(
            artifact_file( "archive:file:///plugins/sample.zip!/sample/Main.wasm" ),
            Some( PathBuf::from( "/plugins/sample.zip" )),
        );
    }

    #[test]
    fn nested_location_without_scheme_prefix() {
        assert_eq!(
            artifact_file( "file:///plugins/sample.zip!/Main.wasm" ),
            Some( PathBuf::from( "/plugins/sample.zip" )),
        );
    }

    #[test]
    fn plain_location_resolves_directly() {
        assert_eq!( artifact_file( "file:///plugins/sample/" ), Some( PathBuf::from( "/plugins/sample" )));
        assert_eq!( artifact_file( "file:///plugins/sample.bundle" ), Some( PathBuf::from( "/plugins/sample.bundle" )));
    }

    #[test]
    fn loose_unit_has_no_boundary() {
        assert_eq!( artifact_file( "file:///plugins/Main.wasm" ), None );
    }

    #[test]
    fn repeated_boundary_is_ambiguous() {
        assert_eq!( artifact_file( "archive:file:///a.zip!/inner.zip!/Main.wasm" ), None );
    }

    #[test]
    fn non_file_urls_are_rejected() {
        assert_eq!( artifact_file( "memory:sample" ), None );
        assert_eq!( artifact_file( "not a url" ), None );
    }
}
