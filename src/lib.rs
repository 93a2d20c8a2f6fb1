//! Runtime loading of independently packaged plugins.
//!
//! Each plugin is loaded through its own [`ModuleLoader`], which owns the plugin's
//! symbol namespace: the artifacts on its search path and a cache of everything it
//! has resolved. Loaders that cannot find a symbol locally may ask their siblings,
//! which is how plugins share code without knowing about each other up front.
//!
//! # Core Concepts
//!
//! - [`Symbol`]: a named, loadable code unit, resolved by fully-qualified name
//! 	(`sample.Main`). A symbol is a native [`PluginType`], a wasm [`Component`], or
//! 	an opaque shared value.
//!
//! - [`Artifact`]: the packaged unit symbols are loaded from. [`ComponentArchive`] reads
//! 	zip files of components, [`ComponentDirectory`] reads the same layout from disk,
//! 	[`NativeBundle`] holds Rust types registered in-process.
//!
//! - [`ModuleLoader`]: resolves symbols, first from its own search path, then (one hop
//! 	only) from the other live loaders of its [`ModuleRegistry`]. A loader can also
//! 	delegate entirely to another loader.
//!
//! - [`ModuleRegistry`]: a weakly-held set of loaders. Membership never keeps a loader
//! 	alive; closing a loader removes it.
//!
//! - [`Plugin`]: the capability contract. A main type must have exactly one
//! 	[`Constructor`]; after construction [`Plugin::init`] is called once with the
//! 	plugin's config file, data folder, descriptor, artifact file, logger and host.
//!
//! - [`PluginHost`]: runs the whole protocol for one [`PluginDescriptor`] and artifact,
//! 	and returns a [`LoadedPlugin`].
//!
//! # Example
//!
//! ```
//! use std::path::PathBuf ;
//! use std::sync::Arc ;
//! use wasm_plugin_loader::{
//! 	Engine, HostHandle, ModuleRegistry, NativeBundle, Plugin, PluginDescriptor,
//! 	PluginError, PluginHost, PluginLogger, PluginType,
//! };
//!
//! #[derive( Default )]
//! struct Sample ;
//!
//! impl Plugin for Sample {
//! 	fn init(
//! 		&mut self,
//! 		_config_file: PathBuf,
//! 		_data_folder: PathBuf,
//! 		_descriptor: PluginDescriptor,
//! 		_file: PathBuf,
//! 		logger: PluginLogger,
//! 		_host: HostHandle,
//! 	) -> Result<(), PluginError> {
//! 		logger.info( "enabled" );
//! 		Ok(())
//! 	}
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Loaders of this host only see each other, not the rest of the process.
//! let host = PluginHost::new( Engine::default(), "/srv/bot/plugins", HostHandle::new( "bot" ))
//! 	.with_registry( ModuleRegistry::new() );
//!
//! let artifact = NativeBundle::new( "file:///srv/bot/plugins/sample.bundle" )
//! 	.with_plugin( "sample.Main", PluginType::of::<Sample>() );
//!
//! let plugin = host.load_plugin_from(
//! 	PluginDescriptor::new( "sample", "sample.Main", "1.0.0" ),
//! 	Arc::new( artifact ),
//! )?;
//! assert_eq!( plugin.main_symbol().name(), "sample.Main" );
//!
//! // Closing the loader releases its artifacts and removes it from fallback.
//! plugin.unload()?;
//! assert!( host.registry().is_empty() );
//! # Ok(())
//! # }
//! ```
//!
//! # Fallback Resolution
//!
//! A loader that misses locally asks every other live loader in its registry, with
//! fallback disabled for them. The first hit is cached on the asking loader. Because
//! fallback never fans out further, resolution is bounded to one pass over the live
//! loaders: a symbol only reachable by searching a sibling's siblings is not found.
//! A sibling still answers from its cache, so a symbol it already resolved through
//! its own fallback is returned.
//!
//! ```
//! # use std::sync::Arc ;
//! # use wasm_plugin_loader::{ ModuleLoader, ModuleRegistry, NativeBundle, ResolveError };
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = ModuleRegistry::new();
//! let library = ModuleLoader::in_registry( Arc::clone( &registry ));
//! library.add_artifact( Arc::new( NativeBundle::new( "file:///plugins/library.bundle" )
//! 	.with_shared( "library.Codec", "utf-8" )))?;
//!
//! let consumer = ModuleLoader::in_registry( Arc::clone( &registry ));
//! let codec = consumer.find_symbol( "library.Codec", true )?;
//! assert_eq!( codec, library.find_symbol( "library.Codec", false )? );
//!
//! library.close()?;
//! let other = ModuleLoader::in_registry( registry );
//! assert!( matches!( other.find_symbol( "library.Codec", true ), Err( ResolveError::NotFound( _ ))));
//! # Ok(())
//! # }
//! ```
//!
//! # Component Plugins
//!
//! A wasm component satisfies the plugin contract when it exports a top-level `init`
//! function. Its constructors are the top-level function exports named `new` or
//! `new-*`; exactly one is required. The component may import
//! `log: func( message: string )` to write through its plugin logger.

mod artifact ;
mod component_plugin ;
mod host ;
mod loader ;
mod location ;
mod logger ;
mod plugin ;
mod plugin_type ;
mod registry ;
mod symbol ;
mod symbol_cache ;

#[doc( no_inline )]
pub use wasmtime::Engine ;
#[doc( no_inline )]
pub use wasmtime::component::Component ;

pub use artifact::{ Artifact, ArtifactError, ComponentArchive, ComponentDirectory, NativeBundle, open_artifact };
pub use component_plugin::{ ComponentPlugin, ComponentState, PluginInit };
pub use host::{ LoadError, LoadedPlugin, PluginHost, CONFIG_FILE_NAME };
pub use loader::{ ModuleLoader, ResolveError };
pub use logger::{ LoggerFactory, PluginLogger };
pub use plugin::{ HostHandle, Plugin, PluginDescriptor, PluginError };
pub use plugin_type::{ Constructor, PluginMain, PluginType };
pub use registry::ModuleRegistry ;
pub use symbol::{ Definition, Symbol, SymbolKind };
