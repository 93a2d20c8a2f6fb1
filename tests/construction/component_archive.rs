use wasm_plugin_loader::{ Engine, HostHandle, LoadError, ModuleRegistry, PluginDescriptor, PluginError, PluginHost };
use crate::components ;

fn host( root: &std::path::Path ) -> PluginHost {
	PluginHost::new( Engine::default(), root, HostHandle::new(()))
		.with_registry( ModuleRegistry::new() )
}

#[test]
fn component_archive_loads_end_to_end() {

	let dir = tempfile::tempdir().expect( "Failed to create temp dir" );
	let archive = components::write_archive( dir.path(), "sample.zip", &[
		( "sample/Main.wasm", components::PLUGIN ),
		( "sample/Helper.wasm", components::LIBRARY ),
	]);
	let host = host( dir.path() );

	let plugin = host.load_plugin( PluginDescriptor::new( "sample", "sample.Main", "1.0.0" ), &archive )
		.expect( "Failed to load plugin" );

	let location = plugin.main_symbol().location();
	assert!( location.starts_with( "archive:file:///" ), "Unexpected location: {}", location );
	assert!( location.ends_with( "/sample.zip!/sample/Main.wasm" ), "Unexpected location: {}", location );

	let helper = plugin.loader().find_symbol( "sample.Helper", false ).expect( "Helper not found" );
	assert!( helper.location().ends_with( "!/sample/Helper.wasm" ));

	plugin.unload().expect( "Failed to unload plugin" );
	assert!( !helper.is_live() );

}

#[test]
fn component_archive_missing_main() {

	let dir = tempfile::tempdir().expect( "Failed to create temp dir" );
	let archive = components::write_archive( dir.path(), "sample.zip", &[( "sample/Other.wasm", components::PLUGIN )]);

	match host( dir.path() ).load_plugin( PluginDescriptor::new( "sample", "sample.Main", "1.0.0" ), &archive ) {
		Err( LoadError::NotFound( name )) => assert_eq!( name, "sample.Main" ),
		value => panic!( "Expected NotFound, found: {:#?}", value ),
	}

}

#[test]
fn component_archive_trapping_init() {

	let dir = tempfile::tempdir().expect( "Failed to create temp dir" );
	let archive = components::write_archive( dir.path(), "sample.zip", &[( "sample/Main.wasm", components::TRAPPING_INIT )]);
	let host = host( dir.path() );

	match host.load_plugin( PluginDescriptor::new( "sample", "sample.Main", "1.0.0" ), &archive ) {
		Err( LoadError::Construction( PluginError::Runtime( _ ))) => {},
		value => panic!( "Expected RuntimeException, found: {:#?}", value ),
	}
	assert!( host.registry().is_empty() );

}

#[test]
fn component_archive_not_an_archive() {

	let dir = tempfile::tempdir().expect( "Failed to create temp dir" );
	let path = dir.path().join( "broken.zip" );
	std::fs::write( &path, "definitely not a zip" ).expect( "Failed to write fixture" );

	match host( dir.path() ).load_plugin( PluginDescriptor::new( "sample", "sample.Main", "1.0.0" ), &path ) {
		Err( LoadError::Artifact( _ )) => {},
		value => panic!( "Expected Artifact error, found: {:#?}", value ),
	}

}
