use std::path::PathBuf ;
use wasmtime::{ Store, StoreContextMut };
use wasmtime::component::{ Component, Instance, Linker };

use crate::{ HostHandle, Plugin, PluginDescriptor, PluginError, PluginLogger };

/// Export called to initialize a component plugin.
pub(crate) const INIT_EXPORT: &str = "init" ;
/// Host function components may import to write to their plugin logger.
pub(crate) const LOG_IMPORT: &str = "log" ;



/// What a component plugin was initialized with.
#[derive( Debug, Clone )]
pub struct PluginInit {
	pub config_file: PathBuf,
	pub data_folder: PathBuf,
	pub descriptor: PluginDescriptor,
	pub file: PathBuf,
	pub logger: PluginLogger,
	pub host: HostHandle,
}

/// The data of a component plugin's store.
#[derive( Debug, Default )]
pub struct ComponentState {
	init: Option<PluginInit>,
}

impl ComponentState {
	/// Set once [`Plugin::init`] has been called.
	#[inline] pub fn init( &self ) -> Option<&PluginInit> { self.init.as_ref() }
}

/// A plugin implemented by a wasm component.
///
/// Constructing it instantiates the component in its own store and calls the
/// constructor export; [`Plugin::init`] records the init context in the store and
/// calls the `init` export. The component may import `log: func( message: string )`
/// to write through its plugin logger.
pub struct ComponentPlugin {
	store: Store<ComponentState>,
	instance: Instance,
}

impl ComponentPlugin {

	pub(crate) fn instantiate( component: &Component, constructor: &str ) -> Result<Self, PluginError> {
		let engine = component.engine();
		let mut linker = Linker::<ComponentState>::new( engine );
		linker.root().func_wrap( LOG_IMPORT, | store: StoreContextMut<'_, ComponentState>, ( message, ): ( String, ) | {
			match store.data().init() {
				Some( init ) => init.logger.info( &message ),
				None => tracing::info!( target: "plugin", "{}", message ),
			}
			Ok(())
		})?;
		let mut store = Store::new( engine, ComponentState::default() );
		let instance = linker.instantiate( &mut store, component )?;
		let mut plugin = Self { store, instance };
		plugin.call( constructor )?;
		Ok( plugin )
	}

	fn call( &mut self, export: &str ) -> Result<(), PluginError> {
		let func = self.instance
			.get_func( &mut self.store, export )
			.ok_or_else(|| PluginError::MissingExport( export.to_string() ))?;
		func.call( &mut self.store, &[], &mut [] )?;
		let _ = func.post_return( &mut self.store );
		Ok(())
	}

	/// The store's data.
	#[inline] pub fn state( &self ) -> &ComponentState { self.store.data() }

	/// The underlying instance, for calling further exports.
	#[inline] pub fn instance( &self ) -> &Instance { &self.instance }

	/// The underlying store.
	#[inline] pub fn store_mut( &mut self ) -> &mut Store<ComponentState> { &mut self.store }

}

impl Plugin for ComponentPlugin {
	fn init(
		&mut self,
		config_file: PathBuf,
		data_folder: PathBuf,
		descriptor: PluginDescriptor,
		file: PathBuf,
		logger: PluginLogger,
		host: HostHandle,
	) -> Result<(), PluginError> {
		self.store.data_mut().init = Some( PluginInit { config_file, data_folder, descriptor, file, logger, host });
		self.call( INIT_EXPORT )
	}
}

impl std::fmt::Debug for ComponentPlugin {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		f.debug_struct( "ComponentPlugin" )
			.field( "state", self.store.data() )
			.finish_non_exhaustive()
	}
}
