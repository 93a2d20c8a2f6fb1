use std::path::PathBuf ;
use std::sync::Arc ;
use wasm_plugin_loader::{ Engine, HostHandle, ModuleRegistry, NativeBundle, PluginDescriptor, PluginHost, PluginLogger };
use crate::plugins ;

#[test]
fn init_context_paths() {

	let handle = HostHandle::new( "bot" );
	let host = PluginHost::new( Engine::default(), "/srv/bot/plugins", handle.clone() )
		.with_registry( ModuleRegistry::new() );
	let ( plugin_type, records ) = plugins::recording();
	let descriptor = PluginDescriptor::new( "sample", "sample.Main", "1.0.0" )
		.with_description( "A sample plugin" )
		.with_authors([ "someone" ]);

	let plugin = host.load_plugin_from(
		descriptor.clone(),
		Arc::new( NativeBundle::new( "file:///srv/bot/plugins/sample.bundle" ).with_plugin( "sample.Main", plugin_type )),
	).expect( "Failed to load plugin" );

	let records = records.lock().unwrap();
	assert_eq!( records.len(), 1 );
	let record = &records[0];

	assert_eq!( record.data_folder, PathBuf::from( "/srv/bot/plugins/sample" ));
	assert_eq!( record.config_file, PathBuf::from( "/srv/bot/plugins/sample/config.yml" ));
	assert_eq!( record.file, PathBuf::from( "/srv/bot/plugins/sample.bundle" ));
	assert_eq!( record.descriptor, descriptor );
	assert_eq!( record.logger, "sample" );
	assert!( record.host.ptr_eq( &handle ));
	assert_eq!( record.host.downcast_ref::<&str>(), Some( &"bot" ));

	assert_eq!( plugin.descriptor(), &descriptor );
	assert_eq!( host.data_folder( &descriptor ), record.data_folder );

}

#[test]
fn init_context_archive_file() {

	let host = PluginHost::new( Engine::default(), "/srv/bot/plugins", HostHandle::new(()))
		.with_registry( ModuleRegistry::new() );
	let ( plugin_type, records ) = plugins::recording();

	host.load_plugin_from(
		PluginDescriptor::new( "sample", "sample.Main", "1.0.0" ),
		Arc::new( NativeBundle::new( "archive:file:///srv/bot/sample.zip!/sample/Main.wasm" ).with_plugin( "sample.Main", plugin_type )),
	).expect( "Failed to load plugin" );

	assert_eq!( records.lock().unwrap()[0].file, PathBuf::from( "/srv/bot/sample.zip" ));

}

#[test]
fn init_context_custom_logger() {

	let host = PluginHost::new( Engine::default(), "/srv/bot/plugins", HostHandle::new(()))
		.with_registry( ModuleRegistry::new() )
		.with_logger_factory(| descriptor | PluginLogger::new( format!( "bot/{}", descriptor.name() )));
	let ( plugin_type, records ) = plugins::recording();

	host.load_plugin_from(
		PluginDescriptor::new( "sample", "sample.Main", "1.0.0" ),
		Arc::new( NativeBundle::new( "file:///srv/bot/plugins/sample.bundle" ).with_plugin( "sample.Main", plugin_type )),
	).expect( "Failed to load plugin" );

	assert_eq!( records.lock().unwrap()[0].logger, "bot/sample" );

}
