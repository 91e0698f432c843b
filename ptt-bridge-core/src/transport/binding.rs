use std::sync::Arc;

use crate::models::peer::ProfileKind;
use crate::traits::profile::ProfileProxy;
use crate::traits::radio::RadioAdapter;

/// RAII guard over a bound profile proxy.
///
/// The proxy goes back to the adapter exactly once: on `release` or, on any
/// other path (early return, panic), when the guard is dropped.
pub struct ProfileBinding<A: RadioAdapter + ?Sized> {
    adapter: Arc<A>,
    profile: ProfileKind,
    proxy: Option<Box<dyn ProfileProxy>>,
}

impl<A: RadioAdapter + ?Sized> ProfileBinding<A> {
    pub fn new(adapter: Arc<A>, profile: ProfileKind, proxy: Box<dyn ProfileProxy>) -> Self {
        Self {
            adapter,
            profile,
            proxy: Some(proxy),
        }
    }

    pub fn profile(&self) -> ProfileKind {
        self.profile
    }

    /// The bound proxy; `None` once released.
    pub fn proxy(&self) -> Option<&dyn ProfileProxy> {
        self.proxy.as_deref()
    }

    pub fn release(mut self) {
        self.close();
    }

    fn close(&mut self) {
        if let Some(proxy) = self.proxy.take() {
            self.adapter.close_profile_proxy(self.profile, proxy);
            log::debug!("{:?} proxy released", self.profile);
        }
    }
}

impl<A: RadioAdapter + ?Sized> Drop for ProfileBinding<A> {
    fn drop(&mut self) {
        self.close();
    }
}
