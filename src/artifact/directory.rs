use std::path::{ Path, PathBuf };
use url::Url ;
use wasmtime::Engine ;
use wasmtime::component::Component ;

use crate::{ Definition, SymbolKind };
use super::{ Artifact, ArtifactError, entry_name };



/// An exploded artifact: a directory laid out like a [`ComponentArchive`]( super::ComponentArchive ).
///
/// Every symbol it defines reports the directory's own `file:` URL as its location.
#[derive( Debug )]
pub struct ComponentDirectory {
    engine: Engine,
    root: PathBuf,
    location: String,
}

impl ComponentDirectory {

    /// # Errors
    /// Fails when `root` does not exist or cannot be expressed as a URL.
    pub fn open( engine: &Engine, root: impl AsRef<Path> ) -> Result<Self, ArtifactError> {
        let root = root.as_ref().canonicalize()?;
        let location = Url::from_directory_path( &root )
            .map_err(|()| ArtifactError::InvalidPath( root.clone() ))?
            .to_string();
        Ok( Self { engine: engine.clone(), root, location })
    }

    /// The directory on disk.
    #[inline] pub fn root( &self ) -> &Path { &self.root }

}

impl Artifact for ComponentDirectory {

    fn location( &self ) -> &str { &self.location }

    fn define( &self, name: &str ) -> Result<Option<Definition>, ArtifactError> {
        let Some( entry ) = entry_name( name ) else { return Ok( None ) };
        let path = self.root.join( entry );
        if !path.is_file() { return Ok( None ) }
        let component = Component::from_file( &self.engine, &path ).map_err( ArtifactError::Compile )?;
        Ok( Some( Definition::new( self.location.clone(), SymbolKind::Component( component ))))
    }

}
