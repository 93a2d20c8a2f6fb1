//! Loading plugins end to end.
//!
//! [`PluginHost`] ties a loader to each plugin it loads: it resolves the
//! descriptor's main symbol through a fresh [`ModuleLoader`], runs the construction
//! protocol, and hands back a [`LoadedPlugin`] that owns both the instance and the
//! loader. Nothing of a failed load stays reachable.

use std::path::{ Path, PathBuf };
use std::sync::Arc ;
use pipe_trait::Pipe ;
use thiserror::Error ;
use tracing::{ info, info_span, warn };
use wasmtime::Engine ;

use crate::{
    Artifact, ArtifactError, HostHandle, LoggerFactory, ModuleLoader, ModuleRegistry,
    Plugin, PluginDescriptor, PluginError, PluginLogger, PluginMain, ResolveError, Symbol,
};
use crate::artifact::open_artifact ;
use crate::location::artifact_file ;

/// Name of the configuration file inside a plugin's data folder.
pub const CONFIG_FILE_NAME: &str = "config.yml" ;

/// Errors that abort loading a plugin.
#[derive( Debug, Error )]
pub enum LoadError {
    /// The main symbol could not be resolved.
    #[error( "Symbol Not Found: {0}" )] NotFound( String ),
    /// The main symbol is already loaded by some loader in the registry.
    #[error( "Duplicate Definition: {0}" )] DuplicateDefinition( String ),
    /// The main type does not have exactly one constructor.
    #[error( "Ambiguous Constructor: {name} has {count} constructors, expected 1" )]
    AmbiguousConstructor { name: String, count: usize },
    /// The main symbol does not satisfy the plugin contract.
    #[error( "Not A Plugin: {0}" )] NotAPlugin( String ),
    /// The main type's location cannot be mapped to a single artifact file.
    #[error( "Invalid Artifact Location: {0}" )] InvalidArtifactLocation( String ),
    /// The loader was closed.
    #[error( "Loader Closed" )] Closed,
    /// The artifact could not be opened or read.
    #[error( "Artifact Error: {0}" )] Artifact( #[from] ArtifactError ),
    /// Constructing or initializing the plugin failed.
    #[error( "Construction Failed: {0}" )] Construction( #[from] PluginError ),
}

impl From<ResolveError> for LoadError {
    fn from( error: ResolveError ) -> Self { match error {
        ResolveError::NotFound( name ) => Self::NotFound( name ),
        ResolveError::Closed => Self::Closed,
        ResolveError::Artifact( err ) => Self::Artifact( err ),
    }}
}

/// Loads plugins into one host.
///
/// ```no_run
/// # use wasm_plugin_loader::{ Engine, HostHandle, PluginDescriptor, PluginHost };
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let host = PluginHost::new( Engine::default(), "plugins", HostHandle::new( "bot" ));
/// let descriptor = PluginDescriptor::new( "sample", "sample.Main", "1.0.0" );
/// let plugin = host.load_plugin( descriptor, "plugins/sample.zip" )?;
/// // ...
/// plugin.unload()?;
/// # Ok(())
/// # }
/// ```
pub struct PluginHost {
    engine: Engine,
    plugins_root: PathBuf,
    host: HostHandle,
    registry: Arc<ModuleRegistry>,
    /// Loader every plugin loader delegates to, when set
    delegate: Option<ModuleLoader>,
    logger_factory: LoggerFactory,
}

impl PluginHost {

    /// Creates a host whose plugins keep their data under `plugins_root` and whose
    /// loaders join the [global]( ModuleRegistry::global ) registry.
    pub fn new( engine: Engine, plugins_root: impl Into<PathBuf>, host: HostHandle ) -> Self {
        Self {
            engine,
            plugins_root: plugins_root.into(),
            host,
            registry: ModuleRegistry::global(),
            delegate: None,
            logger_factory: PluginLogger::factory(),
        }
    }

    /// Places this host's loaders in `registry` instead of the global one.
    pub fn with_registry( mut self, registry: Arc<ModuleRegistry> ) -> Self {
        self.registry = registry ;
        self
    }

    /// Makes every plugin loader delegate to `delegate`, so all plugins of this host
    /// share one namespace.
    pub fn with_delegate( mut self, delegate: ModuleLoader ) -> Self {
        self.delegate = Some( delegate );
        self
    }

    /// Replaces the factory that builds each plugin's logger.
    pub fn with_logger_factory(
        mut self,
        factory: impl Fn( &PluginDescriptor ) -> PluginLogger + Send + Sync + 'static,
    ) -> Self {
        self.logger_factory = Arc::new( factory );
        self
    }

    #[inline] pub fn engine( &self ) -> &Engine { &self.engine }
    #[inline] pub fn plugins_root( &self ) -> &Path { &self.plugins_root }
    #[inline] pub fn registry( &self ) -> &Arc<ModuleRegistry> { &self.registry }

    /// `<plugins root>/<name>`
    pub fn data_folder( &self, descriptor: &PluginDescriptor ) -> PathBuf {
        self.plugins_root.join( descriptor.name() )
    }

    /// A fresh loader for one plugin.
    pub fn new_loader( &self ) -> ModuleLoader {
        match &self.delegate {
            Some( delegate ) => ModuleLoader::delegating_in( Arc::clone( &self.registry ), delegate.clone() ),
            None => ModuleLoader::in_registry( Arc::clone( &self.registry )),
        }
    }

    /// Opens the artifact at `path` and loads the plugin described by `descriptor` from it.
    ///
    /// # Errors
    /// See [`PluginHost::load_plugin_from`]; additionally fails if the artifact cannot be opened.
    pub fn load_plugin( &self, descriptor: PluginDescriptor, path: impl AsRef<Path> ) -> Result<LoadedPlugin, LoadError> {
        open_artifact( &self.engine, path )?
            .pipe(| artifact | self.load_plugin_from( descriptor, artifact ))
    }

    /// Loads the plugin described by `descriptor` from `artifact`.
    ///
    /// On failure the loader created for the attempt is [discarded]( ModuleLoader::discard ):
    /// nothing of the plugin remains reachable, not even on a shared delegate's path.
    ///
    /// # Errors
    /// Any [`LoadError`] raised while looking up the main symbol or constructing it.
    pub fn load_plugin_from( &self, descriptor: PluginDescriptor, artifact: Arc<dyn Artifact> ) -> Result<LoadedPlugin, LoadError> {

        let span = info_span!( "load_plugin", plugin = descriptor.name(), version = descriptor.version() );
        let _guard = span.enter();

        let loader = self.new_loader();
        let attempt = loader.lookup_main( descriptor.main(), artifact )
            .and_then(| main | self.construct( &main, &descriptor ).map(| plugin | ( main, plugin )));

        match attempt {
            Ok(( main, plugin )) => {
                info!( main = descriptor.main(), location = main.symbol().location(), "loaded plugin" );
                Ok( LoadedPlugin { plugin, descriptor, main: main.symbol().clone(), loader })
            },
            Err( err ) => {
                warn!( error = %err, "failed to load plugin" );
                if let Err( close_err ) = loader.discard() {
                    warn!( error = %close_err, "failed to release plugin loader" );
                }
                Err( err )
            },
        }

    }

    /// Runs the construction protocol on a validated main type.
    ///
    /// Instantiates it through its constructor, maps its location to the artifact
    /// file, and calls [`Plugin::init`] with the config file, data folder,
    /// descriptor, artifact file, a logger and the host handle.
    ///
    /// # Errors
    /// - [`LoadError::InvalidArtifactLocation`] if the location has no unambiguous artifact
    /// - [`LoadError::Construction`] if the constructor or `init` fails
    pub fn construct( &self, main: &PluginMain, descriptor: &PluginDescriptor ) -> Result<Box<dyn Plugin>, LoadError> {
        let mut plugin = main.constructor().invoke()?;
        let data_folder = self.data_folder( descriptor );
        let location = main.symbol().location();
        let file = artifact_file( location )
            .ok_or_else(|| LoadError::InvalidArtifactLocation( location.to_string() ))?;
        plugin.init(
            data_folder.join( CONFIG_FILE_NAME ),
            data_folder,
            descriptor.clone(),
            file,
            ( self.logger_factory )( descriptor ),
            self.host.clone(),
        )?;
        Ok( plugin )
    }

    /// Closes a plugin's loader.
    ///
    /// # Errors
    /// See [`ModuleLoader::close`].
    pub fn close( &self, loader: &ModuleLoader ) -> Result<(), ArtifactError> { loader.close() }

}

impl std::fmt::Debug for PluginHost {
    fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
        f.debug_struct( "PluginHost" )
            .field( "plugins_root", &self.plugins_root )
            .field( "registry", &self.registry )
            .field( "delegate", &self.delegate )
            .finish_non_exhaustive()
    }
}

/// A constructed and initialized plugin, with the loader that owns its namespace.
pub struct LoadedPlugin {
    plugin: Box<dyn Plugin>,
    descriptor: PluginDescriptor,
    main: Symbol,
    loader: ModuleLoader,
}

impl LoadedPlugin {

    #[inline] pub fn plugin( &self ) -> &dyn Plugin { &*self.plugin }
    #[inline] pub fn plugin_mut( &mut self ) -> &mut dyn Plugin { &mut *self.plugin }
    #[inline] pub fn descriptor( &self ) -> &PluginDescriptor { &self.descriptor }
    /// The main symbol the plugin was constructed from.
    #[inline] pub fn main_symbol( &self ) -> &Symbol { &self.main }
    #[inline] pub fn loader( &self ) -> &ModuleLoader { &self.loader }

    /// Drops the plugin, then closes its loader.
    ///
    /// # Errors
    /// See [`ModuleLoader::close`].
    pub fn unload( self ) -> Result<(), ArtifactError> {
        let Self { plugin, descriptor, loader, .. } = self ;
        drop( plugin );
        info!( plugin = descriptor.name(), "unloading plugin" );
        loader.close()
    }

}

impl std::fmt::Debug for LoadedPlugin {
    fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
        f.debug_struct( "LoadedPlugin" )
            .field( "descriptor", &self.descriptor )
            .field( "main", &self.main )
            .field( "loader", &self.loader )
            .finish_non_exhaustive()
    }
}
