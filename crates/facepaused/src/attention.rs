use crate::page::{
    SharedPage, CLASS_ATTENTIVE, CLASS_NOT_ATTENTIVE, STATUS_ATTENTIVE, STATUS_NOT_ATTENTIVE,
};
use crate::player::{MediaPlayer, PlayerError};

/// Maps "faces present" to status text, page classes and playback.
pub struct AttentionController<P> {
    page: SharedPage,
    player: P,
}

impl<P: MediaPlayer> AttentionController<P> {
    pub fn new(page: SharedPage, player: P) -> Self {
        Self { page, player }
    }

    /// Update the page, then resume or pause playback. The page is updated
    /// even when the player command fails; that failure is returned.
    pub async fn handle_attention_state(&self, are_faces_detected: bool) -> Result<(), PlayerError> {
        {
            let mut page = self.page.lock().await;
            if are_faces_detected {
                page.set_status(STATUS_ATTENTIVE, CLASS_ATTENTIVE);
                page.remove_root_class(CLASS_NOT_ATTENTIVE);
            } else {
                page.set_status(STATUS_NOT_ATTENTIVE, CLASS_NOT_ATTENTIVE);
                page.add_root_class(CLASS_NOT_ATTENTIVE);
            }
        }

        if are_faces_detected {
            tracing::debug!("attentive; resuming playback");
            self.player.play().await
        } else {
            tracing::debug!("not attentive; pausing playback");
            self.player.pause().await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::Page;
    use crate::testing::FakePlayer;
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn test_faces_present_plays() {
        let page = Page::shared();
        let player = FakePlayer::default();
        let controller = AttentionController::new(page.clone(), player.clone());

        controller.handle_attention_state(true).await.unwrap();

        let page = page.lock().await;
        assert_eq!(page.status_text, "✅ Attentive");
        assert_eq!(page.status_class, "paying-attention");
        assert!(!page.has_root_class("not-paying-attention"));
        assert_eq!(player.calls(), vec!["play"]);
    }

    #[tokio::test]
    async fn test_no_faces_pauses() {
        let page = Page::shared();
        let player = FakePlayer::default();
        let controller = AttentionController::new(page.clone(), player.clone());

        controller.handle_attention_state(false).await.unwrap();

        let page = page.lock().await;
        assert_eq!(page.status_text, "❌ Not attentive");
        assert_eq!(page.status_class, "not-paying-attention");
        assert!(page.has_root_class("not-paying-attention"));
        assert_eq!(player.calls(), vec!["pause"]);
    }

    #[tokio::test]
    async fn test_root_class_follows_last_call() {
        let page = Page::shared();
        let player = FakePlayer::default();
        let controller = AttentionController::new(page.clone(), player.clone());

        for present in [false, false, true, false, true] {
            controller.handle_attention_state(present).await.unwrap();
            let page = page.lock().await;
            assert_eq!(page.has_root_class("not-paying-attention"), !present);
            assert_eq!(page.root_classes.len(), usize::from(!present));
        }
        assert_eq!(player.calls(), vec!["pause", "pause", "play", "pause", "play"]);
    }

    #[tokio::test]
    async fn test_player_failure_still_updates_page() {
        let page = Page::shared();
        let player = FakePlayer::default();
        player.fail.store(true, Ordering::SeqCst);
        let controller = AttentionController::new(page.clone(), player);

        let result = controller.handle_attention_state(false).await;
        assert!(matches!(result, Err(PlayerError::NoPlayer)));
        assert_eq!(page.lock().await.status_text, "❌ Not attentive");
    }
}
