use tokio::sync::RwLock;

use fruitlink_core::domain::chat::View;

/// Navigation state for the single in-process session.
#[derive(Default)]
pub struct ViewStore {
    current: RwLock<View>,
}

impl ViewStore {
    pub async fn current(&self) -> View {
        self.current.read().await.clone()
    }

    /// Replaces the current view and returns the previous one.
    pub async fn navigate(&self, view: View) -> View {
        let mut current = self.current.write().await;
        std::mem::replace(&mut *current, view)
    }

    pub async fn back_to_main(&self) -> View {
        self.navigate(View::Main).await
    }
}

#[cfg(test)]
mod tests {
    use fruitlink_core::domain::chat::View;
    use fruitlink_core::domain::supplier::SupplierId;

    use super::ViewStore;

    #[tokio::test]
    async fn navigate_returns_previous_view() {
        let views = ViewStore::default();
        assert_eq!(views.current().await, View::Main);

        let target = View::Supplier(SupplierId("2".to_string()));
        assert_eq!(views.navigate(target.clone()).await, View::Main);
        assert_eq!(views.current().await, target);

        assert_eq!(views.back_to_main().await, target);
        assert_eq!(views.current().await, View::Main);
    }
}
