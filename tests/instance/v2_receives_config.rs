use std::sync::{ Arc, Mutex };

use mod_link::{ HookResult, LoaderApi, ModConfig, ModInstance, ModObject, ModV1, ModV2 };

use crate::test_configs::config ;
use crate::test_mods::api ;

/// A config-aware fake recording what the loader hands its hooks.
struct ConfigAware {
	seen: Arc<Mutex<Option<( String, String )>>>,
	events: Arc<Mutex<Vec<&'static str>>>,
}

impl ConfigAware {
	fn new() -> ( Self, Arc<Mutex<Option<( String, String )>>>, Arc<Mutex<Vec<&'static str>>> ) {
		let seen = Arc::new( Mutex::new( None ));
		let events = Arc::new( Mutex::new( Vec::new() ));
		let mod_object = Self {
			seen: Arc::clone( &seen ),
			events: Arc::clone( &events ),
		};
		( mod_object, seen, events )
	}
}

impl ModV1 for ConfigAware {

	fn start( &mut self, _api: &LoaderApi ) -> HookResult {
		Err( "config-aware mods start through start_with_config".into() )
	}

	fn suspend( &mut self ) -> HookResult {
		self.events.lock().unwrap().push( "suspend" );
		Ok(())
	}

	fn resume( &mut self ) -> HookResult {
		self.events.lock().unwrap().push( "resume" );
		Ok(())
	}

	fn unload( &mut self ) -> HookResult {
		self.events.lock().unwrap().push( "unload" );
		Ok(())
	}

	fn can_suspend( &self ) -> bool { true }

	fn disposing( &mut self ) {
		self.events.lock().unwrap().push( "disposing" );
	}

}

impl ModV2 for ConfigAware {
	fn start_with_config( &mut self, api: &LoaderApi, config: &ModConfig ) -> HookResult {
		self.events.lock().unwrap().push( "start_with_config" );
		*self.seen.lock().unwrap() =
			Some(( api.application_id().to_string(), config.mod_id.clone() ));
		Ok(())
	}
}

#[test]
fn instance_v2_mod_starts_with_its_own_config() {

	let ( mod_object, seen, _events ) = ConfigAware::new();
	let mut instance = ModInstance::in_process(
		ModObject::V2( Box::new( mod_object )),
		config( "app.aware", &[] ),
	);

	instance.start( &api() ).unwrap();

	assert_eq!(
		*seen.lock().unwrap(),
		Some(( "test.app".to_string(), "app.aware".to_string() )),
	);

}

#[test]
fn instance_v2_mod_routes_every_hook() {

	let ( mod_object, _seen, events ) = ConfigAware::new();
	let mut instance = ModInstance::in_process(
		ModObject::V2( Box::new( mod_object )),
		config( "app.aware", &[] ),
	);

	assert!( instance.can_suspend() );
	instance.start( &api() ).unwrap();
	instance.suspend().unwrap();
	instance.resume().unwrap();
	instance.dispose().unwrap();

	assert_eq!(
		*events.lock().unwrap(),
		[ "start_with_config", "suspend", "resume", "disposing", "unload" ],
	);

}
