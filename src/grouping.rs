//! Application grouping and display ordering.
//!
//! Instances are bucketed by application name in first-seen order, then
//! applications are sorted by a fixed priority table and instances by address.

use ahash::AHashMap as HashMap;

use crate::model::{Application, Instance};

/// Rank for names missing from the priority table.
pub const RANK_OTHER: u8 = u8::MAX - 1;
/// Rank for the backend itself, always displayed last.
pub const RANK_PROM: u8 = u8::MAX;

/// Display rank of an application name. Lower sorts first.
pub fn rank(name: &str) -> u8 {
    match name {
        "go" => 1,
        "java" => 2,
        "mysql" => 3,
        "redis" => 4,
        "windows" => 5,
        "linux" => 6,
        "prom" => RANK_PROM,
        _ => RANK_OTHER,
    }
}

/// Groups `(application name, instance)` pairs into ordered applications.
///
/// Applications are ranked by the name of their first-seen instance. The sort
/// is stable, so applications sharing a rank keep first-seen order.
pub fn group_applications<I>(resolved: I) -> Vec<Application>
where
    I: IntoIterator<Item = (String, Instance)>,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut apps: Vec<Application> = Vec::new();

    for (app_name, instance) in resolved {
        match index.get(&app_name) {
            Some(&pos) => apps[pos].instances.push(instance),
            None => {
                index.insert(app_name.clone(), apps.len());
                apps.push(Application {
                    name: app_name,
                    instances: vec![instance],
                });
            }
        }
    }

    apps.sort_by_key(|app| {
        app.instances
            .first()
            .map(|i| rank(&i.name))
            .unwrap_or(RANK_OTHER)
    });
    for app in &mut apps {
        app.instances.sort_by(|a, b| a.address.cmp(&b.address));
    }

    apps
}
