//! Plugin types and their construction entry points.

use std::sync::Arc ;
use itertools::Itertools ;
use wasmtime::component::Component ;
use wasmtime::component::types::ComponentItem ;

use crate::{ LoadError, Plugin, PluginError, Symbol, SymbolKind };
use crate::component_plugin::{ ComponentPlugin, INIT_EXPORT };

/// Top-level component exports with this name, or this name followed by `-`,
/// are construction entry points.
pub(crate) const CONSTRUCTOR_EXPORT: &str = "new" ;

type Construct = dyn Fn() -> Result<Box<dyn Plugin>, PluginError> + Send + Sync ;



/// A way to instantiate a plugin type.
#[derive( Clone )]
pub struct Constructor {
	/// Shown in diagnostics
	name: String,
	construct: Arc<Construct>,
}

impl Constructor {

	/// Wraps a closure producing a fresh, uninitialized plugin.
	pub fn new(
		name: impl Into<String>,
		construct: impl Fn() -> Result<Box<dyn Plugin>, PluginError> + Send + Sync + 'static,
	) -> Self {
		Self { name: name.into(), construct: Arc::new( construct ) }
	}

	/// Constructs `P` through its [`Default`] implementation.
	pub fn of<P: Plugin + Default>() -> Self {
		Self::new( std::any::type_name::<P>(), || Ok( Box::new( P::default() ) as Box<dyn Plugin> ))
	}

	#[inline] pub fn name( &self ) -> &str { &self.name }

	/// Runs the constructor.
	///
	/// # Errors
	/// Propagates whatever the constructor reports.
	pub fn invoke( &self ) -> Result<Box<dyn Plugin>, PluginError> { ( self.construct )() }

}

impl std::fmt::Debug for Constructor {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		f.debug_struct( "Constructor" ).field( "name", &self.name ).finish_non_exhaustive()
	}
}

/// A type that satisfies the plugin contract, with every construction entry point
/// it exposes. Only types with exactly one are loadable.
#[derive( Debug, Clone )]
pub struct PluginType {
	constructors: Vec<Constructor>,
}

impl PluginType {

	pub fn new( constructors: impl IntoIterator<Item = Constructor> ) -> Self {
		Self { constructors: constructors.into_iter().collect() }
	}

	/// A type constructed through `P`'s [`Default`] implementation.
	pub fn of<P: Plugin + Default>() -> Self { Self::new([ Constructor::of::<P>() ]) }

	#[inline] pub fn constructors( &self ) -> &[Constructor] { &self.constructors }

	/// Reads the plugin shape off a component: it must export `init`, and every
	/// `new`/`new-*` function export is a constructor. Returns `None` for components
	/// that do not export `init`.
	pub fn from_component( component: &Component ) -> Option<Self> {
		let functions = component.component_type()
			.exports( component.engine() )
			.filter(|( _, item )| matches!( item, ComponentItem::ComponentFunc( _ )))
			.map(|( name, _ )| name.to_string() )
			.collect_vec();
		if !functions.iter().any(| name | name == INIT_EXPORT ) { return None }
		Some( Self::new( functions.into_iter()
			.filter(| name | is_constructor_export( name ))
			.map(| export | {
				let component = component.clone();
				Constructor::new( export.clone(), move || ComponentPlugin::instantiate( &component, &export )
					.map(| plugin | Box::new( plugin ) as Box<dyn Plugin> ))
			})
		))
	}

}

fn is_constructor_export( name: &str ) -> bool {
	name.strip_prefix( CONSTRUCTOR_EXPORT ).is_some_and(| rest | rest.is_empty() || rest.starts_with( '-' ))
}

/// A plugin main symbol that passed validation: it satisfies the plugin contract
/// and has exactly one constructor.
#[derive( Debug, Clone )]
pub struct PluginMain {
	symbol: Symbol,
	constructor: Constructor,
}

impl PluginMain {

	pub(crate) fn from_symbol( symbol: Symbol ) -> Result<Self, LoadError> {
		let plugin_type = match symbol.kind() {
			SymbolKind::Plugin( plugin_type ) => plugin_type.clone(),
			SymbolKind::Component( component ) => PluginType::from_component( component )
				.ok_or_else(|| LoadError::NotAPlugin( symbol.name().to_string() ))?,
			SymbolKind::Shared( _ ) => return Err( LoadError::NotAPlugin( symbol.name().to_string() )),
		};
		match plugin_type.constructors() {
			[ constructor ] => Ok( Self { constructor: constructor.clone(), symbol }),
			constructors => Err( LoadError::AmbiguousConstructor {
				name: symbol.name().to_string(),
				count: constructors.len(),
			}),
		}
	}

	/// The resolved main symbol.
	#[inline] pub fn symbol( &self ) -> &Symbol { &self.symbol }

	/// The single constructor of the main type.
	#[inline] pub fn constructor( &self ) -> &Constructor { &self.constructor }

}

#[cfg( test )]
mod tests {
	use super::is_constructor_export ;

	#[test]
	fn constructor_export_names() {
		assert!( is_constructor_export( "new" ));
		assert!( is_constructor_export( "new-with-defaults" ));
		assert!( !is_constructor_export( "newer" ));
		assert!( !is_constructor_export( "init" ));
	}
}
