use std::any::Any ;
use std::collections::HashMap ;
use std::sync::Arc ;
use wasmtime::component::Component ;

use crate::{ Definition, PluginType, SymbolKind };
use super::{ Artifact, ArtifactError };



/// Symbols registered in-process under a caller-chosen location.
///
/// Useful for plugins compiled into the host and for shared values that several
/// plugins resolve by name. The location should be a URL naming the file the
/// bundle stands for (e.g. `file:///plugins/sample.bundle`), since it is what the
/// construction protocol maps back to the plugin's artifact file.
///
/// ```
/// # use wasm_plugin_loader::{ NativeBundle, PluginType };
/// let bundle = NativeBundle::new( "file:///plugins/sample.bundle" )
///     .with_shared( "sample.Version", 3_u32 )
///     .with_plugin( "sample.Main", PluginType::new( Vec::new() ));
/// # let _ = bundle ;
/// ```
#[derive( Debug, Clone )]
pub struct NativeBundle {
    location: String,
    symbols: HashMap<String, SymbolKind>,
}

impl NativeBundle {

    pub fn new( location: impl Into<String> ) -> Self {
        Self { location: location.into(), symbols: HashMap::new() }
    }

    /// Registers a plugin type under `name`.
    pub fn with_plugin( mut self, name: impl Into<String>, plugin_type: PluginType ) -> Self {
        self.symbols.insert( name.into(), SymbolKind::Plugin( plugin_type ));
        self
    }

    /// Registers an already compiled component under `name`.
    pub fn with_component( mut self, name: impl Into<String>, component: Component ) -> Self {
        self.symbols.insert( name.into(), SymbolKind::Component( component ));
        self
    }

    /// Registers an opaque shared value under `name`.
    pub fn with_shared<T: Any + Send + Sync>( mut self, name: impl Into<String>, value: T ) -> Self {
        self.symbols.insert( name.into(), SymbolKind::Shared( Arc::new( value )));
        self
    }

}

impl Artifact for NativeBundle {

    fn location( &self ) -> &str { &self.location }

    fn define( &self, name: &str ) -> Result<Option<Definition>, ArtifactError> {
        Ok( self.symbols.get( name ).map(| kind | Definition::new( self.location.clone(), kind.clone() )))
    }

}
