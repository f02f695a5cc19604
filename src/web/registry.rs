use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use chrono_tz::Tz;
use tracing::info;

use super::SharedForm;
use crate::form::BookingForm;

pub(crate) const FORM_IDLE_TTL: Duration = Duration::from_secs(30 * 60);
pub(crate) const MAX_FORMS: usize = 1024;

struct MountedForm {
    form: SharedForm,
    touched: Instant,
}

/// Mounted forms by id. Idle forms expire; when full, the least recently
/// used form is dropped to make room.
pub(crate) struct FormRegistry {
    forms: Mutex<HashMap<u64, MountedForm>>,
    next_id: AtomicU64,
    idle_ttl: Duration,
    capacity: usize,
}

impl FormRegistry {
    pub(crate) fn new(idle_ttl: Duration, capacity: usize) -> Self {
        Self {
            forms: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            idle_ttl,
            capacity,
        }
    }

    pub(crate) fn mount(&self, tz: Tz) -> u64 {
        self.mount_at(tz, Instant::now())
    }

    pub(crate) fn get(&self, id: u64) -> Option<SharedForm> {
        self.get_at(id, Instant::now())
    }

    pub(crate) fn len(&self) -> usize {
        self.forms.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn mount_at(&self, tz: Tz, now: Instant) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut forms = self.forms.lock().unwrap_or_else(PoisonError::into_inner);
        evict(&mut forms, now, self.idle_ttl, self.capacity);
        forms.insert(
            id,
            MountedForm {
                form: Arc::new(Mutex::new(BookingForm::new(tz))),
                touched: now,
            },
        );
        id
    }

    fn get_at(&self, id: u64, now: Instant) -> Option<SharedForm> {
        let mut forms = self.forms.lock().unwrap_or_else(PoisonError::into_inner);
        let mounted = forms.get_mut(&id)?;
        if now.saturating_duration_since(mounted.touched) > self.idle_ttl {
            forms.remove(&id);
            return None;
        }
        mounted.touched = now;
        Some(Arc::clone(&mounted.form))
    }
}

fn evict(forms: &mut HashMap<u64, MountedForm>, now: Instant, ttl: Duration, capacity: usize) {
    let before = forms.len();
    forms.retain(|_, m| now.saturating_duration_since(m.touched) <= ttl);

    while !forms.is_empty() && forms.len() >= capacity {
        let oldest = forms
            .iter()
            .min_by_key(|(_, m)| m.touched)
            .map(|(id, _)| *id);
        if let Some(id) = oldest {
            forms.remove(&id);
        }
    }

    if forms.len() < before {
        info!("Dropped {} idle booking forms", before - forms.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::UTC;

    const MINUTE: Duration = Duration::from_secs(60);

    #[test]
    fn test_mount_and_get() {
        let registry = FormRegistry::new(MINUTE, 4);
        let a = registry.mount(UTC);
        let b = registry.mount(UTC);
        assert_ne!(a, b);
        assert!(registry.get(a).is_some());
        assert!(registry.get(999).is_none());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_idle_forms_expire() {
        let registry = FormRegistry::new(MINUTE, 4);
        let start = Instant::now();
        let id = registry.mount_at(UTC, start);

        assert!(registry.get_at(id, start + MINUTE / 2).is_some());
        // Touched at +30s, so still alive at +80s
        assert!(registry.get_at(id, start + MINUTE + MINUTE / 3).is_some());
        assert!(registry.get_at(id, start + MINUTE * 3).is_none());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_mount_sweeps_idle_forms() {
        let registry = FormRegistry::new(MINUTE, 100);
        let start = Instant::now();
        for _ in 0..10 {
            registry.mount_at(UTC, start);
        }
        registry.mount_at(UTC, start + MINUTE * 2);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_capacity_drops_least_recently_used() {
        let registry = FormRegistry::new(MINUTE * 10, 2);
        let start = Instant::now();
        let a = registry.mount_at(UTC, start);
        let b = registry.mount_at(UTC, start + Duration::from_secs(1));
        registry.get_at(a, start + Duration::from_secs(2));

        let c = registry.mount_at(UTC, start + Duration::from_secs(3));
        assert_eq!(registry.len(), 2);
        assert!(registry.get_at(a, start + Duration::from_secs(4)).is_some());
        assert!(registry.get_at(b, start + Duration::from_secs(4)).is_none());
        assert!(registry.get_at(c, start + Duration::from_secs(4)).is_some());
    }
}
