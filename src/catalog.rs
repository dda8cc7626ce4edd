//! Product catalog screen state.
//!
//! Holds the list of products as last loaded and opens [`ProductForm`]s for
//! it. Saved records are merged into the list in place; a view that has been
//! unmounted ignores results that arrive afterwards.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::backend::{Backend, BackendError};
use crate::database::models::Product;
use crate::forms::product::{FormError, SubmitOutcome};
use crate::forms::ProductForm;
use crate::session::AuthGuard;
use crate::types::{Role, SessionUser};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Not signed in")]
    NotSignedIn,

    #[error("Only an admin can do that")]
    AdminOnly,

    #[error("Product {0} is not in the catalog")]
    NotFound(Uuid),

    #[error(transparent)]
    Form(#[from] FormError),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

#[derive(Clone)]
pub struct CatalogView {
    backend: Arc<dyn Backend>,
    guard: AuthGuard,
    products: Arc<RwLock<Vec<Product>>>,
    mounted: Arc<AtomicBool>,
}

impl CatalogView {
    pub fn new(backend: Arc<dyn Backend>, guard: AuthGuard) -> Self {
        Self {
            backend,
            guard,
            products: Arc::new(RwLock::new(Vec::new())),
            mounted: Arc::new(AtomicBool::new(true)),
        }
    }

    pub async fn products(&self) -> Vec<Product> {
        self.products.read().await.clone()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::Acquire)
    }

    /// Stop applying results to this view
    pub fn unmount(&self) {
        self.mounted.store(false, Ordering::Release);
    }

    /// Reload the list from the backend, newest first
    pub async fn refresh(&self) -> Result<(), CatalogError> {
        let products = self.backend.list_products().await?;
        let mut slot = self.products.write().await;
        if !self.is_mounted() {
            debug!("Catalog unmounted, dropping {} loaded products", products.len());
            return Ok(());
        }
        *slot = products;
        Ok(())
    }

    fn actor(&self) -> Result<SessionUser, CatalogError> {
        self.guard
            .session()
            .map(|session| session.user)
            .ok_or(CatalogError::NotSignedIn)
    }

    fn require_admin(&self) -> Result<SessionUser, CatalogError> {
        let actor = self.actor()?;
        match self.guard.role() {
            Role::Admin => Ok(actor),
            _ => Err(CatalogError::AdminOnly),
        }
    }

    /// Blank creation form. Only admins get the create control.
    pub fn open_create(&self) -> Result<ProductForm, CatalogError> {
        let actor = self.require_admin()?;
        debug!("{} opened the create form", actor.email);
        Ok(ProductForm::create(Role::Admin))
    }

    /// Edit form with defaults taken from the persisted record
    pub async fn open_edit(&self, id: Uuid) -> Result<ProductForm, CatalogError> {
        self.actor()?;
        let product = match self.backend.get_product(id).await {
            Ok(product) => product,
            Err(BackendError::NotFound(_)) => return Err(CatalogError::NotFound(id)),
            Err(err) => return Err(err.into()),
        };
        Ok(ProductForm::edit(self.guard.role(), &product))
    }

    /// Submit `form` to the backend and merge a saved record into the list.
    ///
    /// The form takes the current role first, so a role that resolved after
    /// the form opened applies to this submission.
    pub async fn save(&self, form: &mut ProductForm) -> Result<SubmitOutcome, CatalogError> {
        let actor = self.actor()?;
        form.set_role(self.guard.role());
        let fields = form.begin_submit()?;

        let result = match form.original() {
            Some(original) => self.backend.update_product(&actor, original.id, fields).await,
            None => self.backend.insert_product(&actor, fields).await,
        };

        let outcome = form.finish_submit(result);
        if let SubmitOutcome::Succeeded(product) = &outcome {
            self.merge(product.clone()).await;
        }
        Ok(outcome)
    }

    /// Replace the record with the same id, or put a new one first
    async fn merge(&self, product: Product) {
        let mut products = self.products.write().await;
        if !self.is_mounted() {
            debug!("Catalog unmounted, not merging product {}", product.id);
            return;
        }
        match products.iter_mut().find(|p| p.id == product.id) {
            Some(slot) => *slot = product,
            None => products.insert(0, product),
        }
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), CatalogError> {
        let actor = self.require_admin()?;
        match self.backend.delete_product(&actor, id).await {
            Ok(()) => {}
            Err(BackendError::NotFound(_)) => return Err(CatalogError::NotFound(id)),
            Err(err) => return Err(err.into()),
        }
        info!("{} deleted product {}", actor.email, id);

        let mut products = self.products.write().await;
        if self.is_mounted() {
            products.retain(|p| p.id != id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MemoryBackend, ProductBackend};
    use crate::database::models::ProductFields;
    use crate::forms::product::{FormState, QUANTITY_CANNOT_INCREMENT};
    use crate::forms::ProductField;
    use crate::session::{BackendSessionProvider, SessionProvider, SessionState};
    use crate::types::Session;
    use rust_decimal::Decimal;
    use tokio::sync::watch;

    struct StubProvider(watch::Sender<SessionState>);

    impl SessionProvider for StubProvider {
        fn on_session_change(&self) -> watch::Receiver<SessionState> {
            self.0.subscribe()
        }
    }

    struct Fixture {
        backend: MemoryBackend,
        provider: BackendSessionProvider,
        admin: SessionUser,
    }

    async fn fixture() -> Fixture {
        let backend = MemoryBackend::new();
        let admin = backend.add_user("admin@domo.store", "admin-pass", Role::Admin).await.unwrap();
        backend.add_user("cashier@domo.store", "cashier-pass", Role::Cashier).await.unwrap();
        let provider = BackendSessionProvider::new(Arc::new(backend.clone()));
        Fixture { backend, provider, admin }
    }

    fn fields(name: &str, quantity: i32) -> ProductFields {
        ProductFields {
            name: name.to_string(),
            quantity,
            price: Decimal::new(250, 2),
        }
    }

    impl Fixture {
        fn view(&self) -> CatalogView {
            CatalogView::new(Arc::new(self.backend.clone()), AuthGuard::new(&self.provider))
        }
    }

    #[tokio::test]
    async fn cashier_decrement_saves_in_place() {
        let f = fixture().await;
        let milk = f.backend.insert_product(&f.admin, fields("Milk", 10)).await.unwrap();
        f.backend.insert_product(&f.admin, fields("Bread", 4)).await.unwrap();

        f.provider.sign_in("cashier@domo.store", "cashier-pass").await.unwrap();
        let view = f.view();
        view.refresh().await.unwrap();
        let before: Vec<Uuid> = view.products().await.iter().map(|p| p.id).collect();

        let mut form = view.open_edit(milk.id).await.unwrap();
        assert_eq!(form.autofocus(), ProductField::Quantity);
        for _ in 0..3 {
            assert!(form.decrement());
        }
        let outcome = view.save(&mut form).await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Succeeded(ref p) if p.quantity == 7));

        let after = view.products().await;
        assert_eq!(after.iter().map(|p| p.id).collect::<Vec<_>>(), before);
        assert_eq!(after.iter().find(|p| p.id == milk.id).unwrap().quantity, 7);

        let reopened = view.open_edit(milk.id).await.unwrap();
        assert_eq!(reopened.draft().quantity, Some(7));
    }

    #[tokio::test]
    async fn cashier_cannot_raise_quantity() {
        let f = fixture().await;
        let milk = f.backend.insert_product(&f.admin, fields("Milk", 10)).await.unwrap();
        f.provider.sign_in("cashier@domo.store", "cashier-pass").await.unwrap();
        let view = f.view();
        view.refresh().await.unwrap();

        let mut form = view.open_edit(milk.id).await.unwrap();
        assert!(!form.increment());
        form.set_quantity(Some(12)).unwrap();

        let err = view.save(&mut form).await.unwrap_err();
        match err {
            CatalogError::Form(FormError::Invalid(errors)) => {
                assert_eq!(errors.message(ProductField::Quantity), Some(QUANTITY_CANNOT_INCREMENT));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(f.backend.get_product(milk.id).await.unwrap().quantity, 10);
    }

    #[tokio::test]
    async fn admin_create_goes_first() {
        let f = fixture().await;
        f.backend.insert_product(&f.admin, fields("Milk", 10)).await.unwrap();
        f.provider.sign_in("admin@domo.store", "admin-pass").await.unwrap();
        let view = f.view();
        view.refresh().await.unwrap();

        let mut form = view.open_create().unwrap();
        form.set_name("Eggs").unwrap();
        form.set_quantity(Some(30)).unwrap();
        let outcome = view.save(&mut form).await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Succeeded(_)));
        assert_eq!(form.state(), FormState::Closed);

        let names: Vec<String> = view.products().await.into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["Eggs".to_string(), "Milk".to_string()]);
    }

    #[tokio::test]
    async fn cashier_cannot_create_or_delete() {
        let f = fixture().await;
        let milk = f.backend.insert_product(&f.admin, fields("Milk", 10)).await.unwrap();
        f.provider.sign_in("cashier@domo.store", "cashier-pass").await.unwrap();
        let view = f.view();

        assert!(matches!(view.open_create(), Err(CatalogError::AdminOnly)));
        assert!(matches!(view.delete(milk.id).await, Err(CatalogError::AdminOnly)));
    }

    #[tokio::test]
    async fn admin_delete_removes_row() {
        let f = fixture().await;
        let milk = f.backend.insert_product(&f.admin, fields("Milk", 10)).await.unwrap();
        f.provider.sign_in("admin@domo.store", "admin-pass").await.unwrap();
        let view = f.view();
        view.refresh().await.unwrap();

        view.delete(milk.id).await.unwrap();
        assert!(view.products().await.is_empty());
        assert!(matches!(view.delete(milk.id).await, Err(CatalogError::NotFound(_))));
    }

    #[tokio::test]
    async fn unmounted_view_ignores_results() {
        let f = fixture().await;
        let milk = f.backend.insert_product(&f.admin, fields("Milk", 10)).await.unwrap();
        f.provider.sign_in("admin@domo.store", "admin-pass").await.unwrap();
        let view = f.view();
        view.refresh().await.unwrap();

        let mut form = view.open_edit(milk.id).await.unwrap();
        form.set_quantity(Some(20)).unwrap();
        view.unmount();
        view.save(&mut form).await.unwrap();

        assert_eq!(view.products().await[0].quantity, 10);
        assert_eq!(f.backend.get_product(milk.id).await.unwrap().quantity, 20);
    }

    #[tokio::test]
    async fn role_resolved_after_open_applies_on_save() {
        let f = fixture().await;
        let milk = f.backend.insert_product(&f.admin, fields("Milk", 10)).await.unwrap();
        let session = Session {
            access_token: "admin-token".to_string(),
            expires_at: 0,
            user: f.admin.clone(),
        };
        let (tx, _) = watch::channel(SessionState::SignedIn {
            session: session.clone(),
            role: Role::Unknown,
        });
        let provider = StubProvider(tx);
        let view = CatalogView::new(Arc::new(f.backend.clone()), AuthGuard::new(&provider));

        let mut form = view.open_edit(milk.id).await.unwrap();
        assert_eq!(form.role(), Role::Unknown);
        assert!(!form.can_increment());

        provider.0.send_replace(SessionState::SignedIn { session, role: Role::Admin });
        form.set_quantity(Some(12)).unwrap();
        let outcome = view.save(&mut form).await.unwrap();

        assert_eq!(form.role(), Role::Admin);
        assert!(matches!(outcome, SubmitOutcome::Succeeded(ref p) if p.quantity == 12));
    }

    #[tokio::test]
    async fn unmount_during_refresh_keeps_list_empty() {
        let f = fixture().await;
        f.backend.insert_product(&f.admin, fields("Milk", 10)).await.unwrap();
        f.provider.sign_in("admin@domo.store", "admin-pass").await.unwrap();
        let view = f.view();

        let held = view.products.write().await;
        let pending = tokio::spawn({
            let view = view.clone();
            async move { view.refresh().await }
        });
        tokio::task::yield_now().await;
        view.unmount();
        drop(held);

        pending.await.unwrap().unwrap();
        assert!(view.products().await.is_empty());
    }

    #[tokio::test]
    async fn signed_out_view_refuses_forms() {
        let f = fixture().await;
        f.provider.restore(None).await;
        let view = f.view();
        assert!(matches!(view.open_create(), Err(CatalogError::NotSignedIn)));
        assert!(matches!(view.open_edit(Uuid::new_v4()).await, Err(CatalogError::NotSignedIn)));
    }
}
