//! The plugin capability contract.
//!
//! Every plugin main type implements [`Plugin`]. The host creates it through the
//! type's single [`Constructor`]( crate::Constructor ) and then calls
//! [`Plugin::init`] exactly once with everything the plugin needs to run: where its
//! configuration and data live, its own descriptor, the artifact it was loaded from,
//! a logger scoped to its name and the host handle.

use std::any::Any ;
use std::path::PathBuf ;
use std::sync::Arc ;
use thiserror::Error ;

use crate::PluginLogger ;

/// A plugin main type.
///
/// # Example
///
/// ```
/// use std::path::PathBuf ;
/// use wasm_plugin_loader::{ HostHandle, Plugin, PluginDescriptor, PluginError, PluginLogger };
///
/// #[derive( Default )]
/// struct Greeter { data_folder: Option<PathBuf> }
///
/// impl Plugin for Greeter {
///     fn init(
///         &mut self,
///         _config_file: PathBuf,
///         data_folder: PathBuf,
///         descriptor: PluginDescriptor,
///         _file: PathBuf,
///         logger: PluginLogger,
///         _host: HostHandle,
///     ) -> Result<(), PluginError> {
///         logger.info( format_args!( "{} v{} ready", descriptor.name(), descriptor.version() ));
///         self.data_folder = Some( data_folder );
///         Ok(())
///     }
/// }
/// ```
pub trait Plugin: Send + 'static {

    /// Initializes the freshly constructed plugin.
    ///
    /// - `config_file`: `<data_folder>/config.yml`; it may not exist yet
    /// - `data_folder`: the plugin's private directory, `<plugins root>/<name>`
    /// - `descriptor`: the plugin's own descriptor
    /// - `file`: the artifact file the main type was loaded from
    /// - `logger`: a logger scoped to the plugin's name
    /// - `host`: the host handle, passed through unmodified
    ///
    /// # Errors
    /// Any error aborts the load; the instance is dropped and never exposed.
    fn init(
        &mut self,
        config_file: PathBuf,
        data_folder: PathBuf,
        descriptor: PluginDescriptor,
        file: PathBuf,
        logger: PluginLogger,
        host: HostHandle,
    ) -> Result<(), PluginError> ;

}

/// Errors raised by a plugin while it is constructed or initialized.
#[derive( Debug, Error )]
pub enum PluginError {
    /// The wasm component trapped or could not be instantiated.
    #[error( "Runtime Exception: {0}" )] Runtime( #[from] wasmtime::Error ),
    /// A component lacks an export the contract requires.
    #[error( "Missing Export: {0}" )] MissingExport( String ),
    /// The plugin rejected its initialization.
    #[error( "Initialisation Failed: {0}" )] Init( String ),
}

/// Immutable plugin metadata, as parsed from the plugin's descriptor file.
#[derive( Debug, Clone, PartialEq, Eq )]
pub struct PluginDescriptor {
    /// Plugin name; also the name of its data folder
    name: String,
    /// Fully-qualified name of the main symbol
    main: String,
    version: String,
    description: Option<String>,
    authors: Vec<String>,
    website: Option<String>,
    api_version: Option<String>,
}

impl PluginDescriptor {

    pub fn new( name: impl Into<String>, main: impl Into<String>, version: impl Into<String> ) -> Self {
        Self {
            name: name.into(),
            main: main.into(),
            version: version.into(),
            description: None,
            authors: Vec::with_capacity( 0 ),
            website: None,
            api_version: None,
        }
    }

    pub fn with_description( mut self, description: impl Into<String> ) -> Self {
        self.description = Some( description.into() );
        self
    }

    pub fn with_authors( mut self, authors: impl IntoIterator<Item = impl Into<String>> ) -> Self {
        self.authors = authors.into_iter().map( Into::into ).collect();
        self
    }

    pub fn with_website( mut self, website: impl Into<String> ) -> Self {
        self.website = Some( website.into() );
        self
    }

    /// Version of the host API the plugin was built against.
    pub fn with_api_version( mut self, api_version: impl Into<String> ) -> Self {
        self.api_version = Some( api_version.into() );
        self
    }

    #[inline] pub fn name( &self ) -> &str { &self.name }
    #[inline] pub fn main( &self ) -> &str { &self.main }
    #[inline] pub fn version( &self ) -> &str { &self.version }
    #[inline] pub fn description( &self ) -> Option<&str> { self.description.as_deref() }
    #[inline] pub fn authors( &self ) -> &[String] { &self.authors }
    #[inline] pub fn website( &self ) -> Option<&str> { self.website.as_deref() }
    #[inline] pub fn api_version( &self ) -> Option<&str> { self.api_version.as_deref() }

}

/// Opaque handle to the host, handed to every plugin on initialization.
///
/// Cloning shares the same underlying value.
#[derive( Clone )]
pub struct HostHandle( Arc<dyn Any + Send + Sync> );

impl HostHandle {

    pub fn new<T: Any + Send + Sync>( host: T ) -> Self { Self( Arc::new( host )) }

    pub fn from_arc( host: Arc<dyn Any + Send + Sync> ) -> Self { Self( host ) }

    /// Borrows the host as `T`, if that is what it is.
    pub fn downcast_ref<T: Any>( &self ) -> Option<&T> { self.0.downcast_ref::<T>() }

    /// Whether both handles refer to the same host.
    pub fn ptr_eq( &self, other: &Self ) -> bool { Arc::ptr_eq( &self.0, &other.0 ) }

}

impl std::fmt::Debug for HostHandle {
    fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
        f.debug_tuple( "HostHandle" ).field( &"<dyn Any>" ).finish()
    }
}
