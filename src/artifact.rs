//! Artifacts: the packaged units plugin symbols are loaded from.
//!
//! An [`Artifact`] maps fully-qualified symbol names to [`Definition`]s. The formats
//! themselves are external contracts; this crate ships three:
//!
//! - [`ComponentArchive`]: a zip file of wasm components, `a.b.C` stored as `a/b/C.wasm`
//! - [`ComponentDirectory`]: the same layout exploded into a directory
//! - [`NativeBundle`]: Rust plugin types and shared values registered in-process
//!
//! Hosts may implement the trait for any other packaging.

use std::path::{ Component, Path, PathBuf };
use std::sync::Arc ;
use std::sync::atomic::{ AtomicBool, Ordering };
use thiserror::Error ;
use wasmtime::Engine ;

use crate::Definition ;

mod archive ;
mod bundle ;
mod directory ;

pub use archive::ComponentArchive ;
pub use bundle::NativeBundle ;
pub use directory::ComponentDirectory ;

/// Errors raised by an artifact while it is opened, searched or released.
#[derive( Debug, Error )]
pub enum ArtifactError {
    /// Reading the artifact from disk failed.
    #[error( "IO Error: {0}" )] Io( #[from] std::io::Error ),
    /// The archive is malformed.
    #[error( "Archive Error: {0}" )] Archive( #[from] zip::result::ZipError ),
    /// A component entry could not be compiled.
    #[error( "Compile Error: {0}" )] Compile( wasmtime::Error ),
    /// The path cannot be expressed as a `file:` URL.
    #[error( "Invalid Path: {}", .0.display() )] InvalidPath( PathBuf ),
    /// The artifact has already released its resources.
    #[error( "Artifact Closed" )] Closed,
}

/// A packaged unit that defines symbols.
///
/// Implementations must be safe to search from several threads at once.
pub trait Artifact: Send + Sync {

    /// URL-style location of the artifact itself.
    fn location( &self ) -> &str ;

    /// Looks up `name`. `Ok( None )` means the artifact does not define it.
    ///
    /// # Errors
    /// Fails when the artifact cannot be read or the definition cannot be built.
    fn define( &self, name: &str ) -> Result<Option<Definition>, ArtifactError> ;

    /// Releases any handles held by the artifact. Called once, by the owning loader.
    ///
    /// # Errors
    /// Implementations may report a failure to release an underlying handle.
    fn close( &self ) -> Result<(), ArtifactError> { Ok(()) }

}

/// Opens the artifact at `path`: a directory becomes a [`ComponentDirectory`],
/// anything else is read as a [`ComponentArchive`].
///
/// # Errors
/// Fails when the path cannot be read or is not a valid archive.
pub fn open_artifact( engine: &Engine, path: impl AsRef<Path> ) -> Result<Arc<dyn Artifact>, ArtifactError> {
    let path = path.as_ref();
    Ok( match path.is_dir() {
        true => Arc::new( ComponentDirectory::open( engine, path )? ),
        false => Arc::new( ComponentArchive::open( engine, path )? ),
    })
}

/// Maps `a.b.C` onto the entry path `a/b/C.wasm`.
///
/// `None` for names that do not map onto a plain relative path: empty segments
/// (`.a.B`, `a..B`) or segments that are themselves path syntax (`a/../B`).
pub(crate) fn entry_name( symbol: &str ) -> Option<String> {
    if symbol.split( '.' ).any( str::is_empty ) { return None }
    let entry = format!( "{}{}", symbol.replace( '.', "/" ), crate::location::UNIT_SUFFIX );
    Path::new( &entry ).components()
        .all(| part | matches!( part, Component::Normal( _ )))
        .then_some( entry )
}

/// An artifact on some loader's search path.
///
/// Tracks whether the owning loader has released it, which is what keeps symbols
/// from outliving their backing resources.
pub(crate) struct OpenArtifact {
    artifact: Arc<dyn Artifact>,
    open: AtomicBool,
}

impl OpenArtifact {

    pub fn new( artifact: Arc<dyn Artifact> ) -> Self {
        Self { artifact, open: AtomicBool::new( true ) }
    }

    #[inline] pub fn is_open( &self ) -> bool { self.open.load( Ordering::Acquire ) }

    #[inline] pub fn location( &self ) -> &str { self.artifact.location() }

    pub fn define( &self, name: &str ) -> Result<Option<Definition>, ArtifactError> {
        if !self.is_open() { return Err( ArtifactError::Closed ) }
        self.artifact.define( name )
    }

    /// Idempotent; only the first call reaches the artifact.
    pub fn close( &self ) -> Result<(), ArtifactError> {
        match self.open.swap( false, Ordering::AcqRel ) {
            true => self.artifact.close(),
            false => Ok(()),
        }
    }

}

impl std::fmt::Debug for OpenArtifact {
    fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
        f.debug_struct( "OpenArtifact" )
            .field( "location", &self.artifact.location() )
            .field( "open", &self.is_open() )
            .finish()
    }
}

#[cfg( test )]
mod tests {
    use std::fs ;
    use wasmtime::Engine ;
    use super::{ Artifact, ComponentDirectory, entry_name };

    #[test]
    fn entry_name_maps_segments_to_directories() {
        assert_eq!( entry_name( "a.b.C" ).as_deref(), Some( "a/b/C.wasm" ));
        assert_eq!( entry_name( "Main" ).as_deref(), Some( "Main.wasm" ));
    }

    #[test]
    fn entry_name_rejects_names_leaving_the_root() {
        assert_eq!( entry_name( ".tmp.outside.Main" ), None );
        assert_eq!( entry_name( "a..Main" ), None );
        assert_eq!( entry_name( "a.Main." ), None );
        assert_eq!( entry_name( "" ), None );
        assert_eq!( entry_name( "a/...Main" ), None );
        assert_eq!( entry_name( "a/../../Main" ), None );
        assert_eq!( entry_name( "/etc.Main" ), None );
    }

    #[test]
    fn directory_does_not_define_files_outside_its_root() {
        let dir = tempfile::Builder::new().prefix( "outside" ).tempdir().unwrap();
        let root = dir.path().join( "root" );
        fs::create_dir( &root ).unwrap();
        fs::write( dir.path().join( "Outside.wasm" ), "not a component" ).unwrap();

        let artifact = ComponentDirectory::open( &Engine::default(), &root ).unwrap();
        // Joined unchecked, an absolute entry replaces the root
        let absolute = format!( "{}.Outside", dir.path().display() );
        assert!( matches!( artifact.define( &absolute ), Ok( None )));
        assert!( matches!( artifact.define( ".Outside" ), Ok( None )));
    }
}
