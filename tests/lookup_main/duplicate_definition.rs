use std::sync::Arc ;
use wasm_plugin_loader::{ LoadError, ModuleLoader, ModuleRegistry, NativeBundle, PluginType };
use crate::plugins::Idle ;

fn sample( location: &str ) -> Arc<NativeBundle> {
	Arc::new( NativeBundle::new( location ).with_plugin( "sample.Main", PluginType::of::<Idle>() ))
}

#[test]
fn duplicate_definition_across_loaders() {

	let registry = ModuleRegistry::new();
	let first = ModuleLoader::in_registry( Arc::clone( &registry ));
	first.lookup_main( "sample.Main", sample( "file:///plugins/first.bundle" ))
		.expect( "First lookup failed" );

	let second = ModuleLoader::in_registry( Arc::clone( &registry ));
	match second.lookup_main( "sample.Main", sample( "file:///plugins/second.bundle" )) {
		Err( LoadError::DuplicateDefinition( name )) => assert_eq!( name, "sample.Main" ),
		value => panic!( "Expected DuplicateDefinition, found: {:#?}", value ),
	}
	assert!( second.search_path().is_empty() );

}

#[test]
fn duplicate_definition_within_one_loader() {

	let loader = ModuleLoader::in_registry( ModuleRegistry::new() );
	loader.lookup_main( "sample.Main", sample( "file:///plugins/first.bundle" ))
		.expect( "First lookup failed" );

	match loader.lookup_main( "sample.Main", sample( "file:///plugins/again.bundle" )) {
		Err( LoadError::DuplicateDefinition( _ )) => {},
		value => panic!( "Expected DuplicateDefinition, found: {:#?}", value ),
	}

}

#[test]
fn duplicate_definition_ignores_closed_loaders() {

	let registry = ModuleRegistry::new();
	let first = ModuleLoader::in_registry( Arc::clone( &registry ));
	first.lookup_main( "sample.Main", sample( "file:///plugins/first.bundle" ))
		.expect( "First lookup failed" );
	first.close().expect( "Failed to close loader" );

	let second = ModuleLoader::in_registry( Arc::clone( &registry ));
	let main = second.lookup_main( "sample.Main", sample( "file:///plugins/second.bundle" ))
		.expect( "Reload after close failed" );
	assert_eq!( main.symbol().location(), "file:///plugins/second.bundle" );

}

#[test]
fn duplicate_definition_ignores_other_registries() {

	let first = ModuleLoader::in_registry( ModuleRegistry::new() );
	first.lookup_main( "sample.Main", sample( "file:///plugins/first.bundle" ))
		.expect( "First lookup failed" );

	let second = ModuleLoader::in_registry( ModuleRegistry::new() );
	assert!( second.lookup_main( "sample.Main", sample( "file:///plugins/second.bundle" )).is_ok() );

}
