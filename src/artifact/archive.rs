use std::fs::File ;
use std::io::Read ;
use std::path::{ Path, PathBuf };
use parking_lot::Mutex ;
use tracing::debug ;
use url::Url ;
use wasmtime::Engine ;
use wasmtime::component::Component ;
use zip::ZipArchive ;
use zip::result::ZipError ;

use crate::{ Definition, SymbolKind };
use crate::location::{ ARCHIVE_SCHEME, BOUNDARY };
use super::{ Artifact, ArtifactError, entry_name };

/// Upper bound on the buffer reserved up front from an entry's declared size.
const MAX_PREALLOCATION: usize = 1 << 20 ;



/// A zip archive of wasm components.
///
/// The archive file stays open until [`Artifact::close`] is called or the value is
/// dropped. Symbols defined by it report a nested location of the form
/// `archive:file:///plugins/sample.zip!/a/b/C.wasm`.
pub struct ComponentArchive {
    engine: Engine,
    path: PathBuf,
    location: String,
    archive: Mutex<Option<ZipArchive<File>>>,
}

impl ComponentArchive {

    /// Opens the archive at `path`; components inside are compiled with `engine`
    /// the first time they are resolved.
    ///
    /// # Errors
    /// Fails when the file cannot be opened or is not a zip archive.
    pub fn open( engine: &Engine, path: impl AsRef<Path> ) -> Result<Self, ArtifactError> {
        let path = path.as_ref().canonicalize()?;
        let location = Url::from_file_path( &path )
            .map_err(|()| ArtifactError::InvalidPath( path.clone() ))?
            .to_string();
        let archive = ZipArchive::new( File::open( &path )? )?;
        debug!( archive = %path.display(), entries = archive.len(), "opened component archive" );
        Ok( Self { engine: engine.clone(), path, location, archive: Mutex::new( Some( archive )) })
    }

    /// Path of the archive on disk.
    #[inline] pub fn path( &self ) -> &Path { &self.path }

    fn read_entry( &self, entry: &str ) -> Result<Option<Vec<u8>>, ArtifactError> {
        let mut guard = self.archive.lock();
        let archive = guard.as_mut().ok_or( ArtifactError::Closed )?;
        let mut file = match archive.by_name( entry ) {
            Ok( file ) => file,
            Err( ZipError::FileNotFound ) => return Ok( None ),
            Err( err ) => return Err( err.into() ),
        };
        let mut bytes = Vec::with_capacity( capacity_hint( file.size() ));
        file.read_to_end( &mut bytes )?;
        Ok( Some( bytes ))
    }

}

/// The declared uncompressed size is untrusted header data.
fn capacity_hint( declared: u64 ) -> usize {
    usize::try_from( declared ).unwrap_or( MAX_PREALLOCATION ).min( MAX_PREALLOCATION )
}

impl Artifact for ComponentArchive {

    fn location( &self ) -> &str { &self.location }

    fn define( &self, name: &str ) -> Result<Option<Definition>, ArtifactError> {
        let Some( entry ) = entry_name( name ) else { return Ok( None ) };
        let Some( bytes ) = self.read_entry( &entry )? else { return Ok( None ) };
        let component = Component::new( &self.engine, &bytes ).map_err( ArtifactError::Compile )?;
        Ok( Some( Definition::new(
            format!( "{}{}{}{}", ARCHIVE_SCHEME, self.location, BOUNDARY, entry ),
            SymbolKind::Component( component ),
        )))
    }

    fn close( &self ) -> Result<(), ArtifactError> {
        if self.archive.lock().take().is_some() {
            debug!( archive = %self.path.display(), "released component archive" );
        }
        Ok(())
    }

}

impl std::fmt::Debug for ComponentArchive {
    fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
        f.debug_struct( "ComponentArchive" )
            .field( "path", &self.path )
            .field( "open", &self.archive.lock().is_some() )
            .finish_non_exhaustive()
    }
}

#[cfg( test )]
mod tests {
    use super::{ MAX_PREALLOCATION, capacity_hint };

    #[test]
    fn declared_size_is_capped() {
        assert_eq!( capacity_hint( 512 ), 512 );
        assert_eq!( capacity_hint( u64::MAX ), MAX_PREALLOCATION );
        assert_eq!( capacity_hint( 1 << 40 ), MAX_PREALLOCATION );
    }
}
