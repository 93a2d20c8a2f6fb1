use std::sync::Arc ;
use wasm_plugin_loader::{ Component, Engine, LoadError, ModuleLoader, ModuleRegistry, NativeBundle };
use crate::components ;

#[test]
fn not_a_plugin_shared_value() {

	let loader = ModuleLoader::in_registry( ModuleRegistry::new() );
	let bundle = NativeBundle::new( "file:///plugins/sample.bundle" ).with_shared( "sample.Main", "not a plugin" );

	match loader.lookup_main( "sample.Main", Arc::new( bundle )) {
		Err( LoadError::NotAPlugin( name )) => assert_eq!( name, "sample.Main" ),
		value => panic!( "Expected NotAPlugin, found: {:#?}", value ),
	}

}

#[test]
fn not_a_plugin_component_without_init() {

	let engine = Engine::default();
	let component = Component::new( &engine, components::LIBRARY ).expect( "Failed to compile fixture" );
	let loader = ModuleLoader::in_registry( ModuleRegistry::new() );
	let bundle = NativeBundle::new( "file:///plugins/sample.bundle" ).with_component( "sample.Main", component );

	match loader.lookup_main( "sample.Main", Arc::new( bundle )) {
		Err( LoadError::NotAPlugin( _ )) => {},
		value => panic!( "Expected NotAPlugin, found: {:#?}", value ),
	}

}
