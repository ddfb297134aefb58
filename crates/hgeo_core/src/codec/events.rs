//! Import notification.
//!
//! Code that keeps derived data in sync with geometry files subscribes to a
//! [`GeoImporter`] and is called back whenever a file is imported through it.

use std::fmt;
use std::path::Path;

use crate::codec::reader::{read_geo, DecodeResult};
use crate::geometry::GeoContainer;

/// Handle returned by [`GeoImporter::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&Path, &GeoContainer)>;

/// Imports geometry files and notifies registered listeners.
#[derive(Default)]
pub struct GeoImporter {
    listeners: Vec<(ListenerId, Listener)>,
    next_id: u64,
}

impl fmt::Debug for GeoImporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeoImporter")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl GeoImporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback, invoked after every successful import.
    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&Path, &GeoContainer) + 'static,
    {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a callback. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Read a geometry file, then call every listener in subscription order.
    ///
    /// Listeners are not called if decoding fails.
    pub fn import<P: AsRef<Path>>(&mut self, path: P) -> DecodeResult<GeoContainer> {
        let path = path.as_ref();
        let geo = read_geo(path)?;
        for (_, listener) in &mut self.listeners {
            listener(path, &geo);
        }
        Ok(geo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{write_geo, EncodeOptions};
    use crate::point::PointData;
    use hgeo_math::Vec3;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_listeners_called_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("points.geo");
        let mut geo = GeoContainer::new();
        geo.add_points(&[PointData::new(Vec3::X)], true).unwrap();
        write_geo(&path, &geo, &EncodeOptions::default()).unwrap();

        let calls = Rc::new(RefCell::new(Vec::new()));
        let mut importer = GeoImporter::new();

        let log = Rc::clone(&calls);
        importer.subscribe(move |_, geo| log.borrow_mut().push(("first", geo.point_count())));
        let log = Rc::clone(&calls);
        let second = importer.subscribe(move |_, geo| log.borrow_mut().push(("second", geo.point_count())));

        importer.import(&path).unwrap();
        assert_eq!(*calls.borrow(), vec![("first", 1), ("second", 1)]);

        assert!(importer.unsubscribe(second));
        assert!(!importer.unsubscribe(second));
        importer.import(&path).unwrap();
        assert_eq!(calls.borrow().len(), 3);
        assert_eq!(importer.listener_count(), 1);
    }

    #[test]
    fn test_failed_import_notifies_nobody() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.geo");
        std::fs::write(&path, "not json").unwrap();

        let called = Rc::new(RefCell::new(false));
        let flag = Rc::clone(&called);
        let mut importer = GeoImporter::new();
        importer.subscribe(move |_, _| *flag.borrow_mut() = true);

        assert!(importer.import(&path).is_err());
        assert!(!*called.borrow());
    }
}
