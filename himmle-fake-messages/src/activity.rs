use himmle_common::{Activity, Chat, CURRENT_USER};
use rand::prelude::{Rng, SliceRandom};
use tokio::sync::mpsc;

/// Emits simulated activity from the participants of `chats` until the receiver is dropped.
pub async fn activity_sender<R: Rng + Send>(
    channel: mpsc::UnboundedSender<Activity>,
    chats: Vec<Chat>,
    mut rng: R,
) {
    loop {
        let Some((activity, millis)) = generate_activity(&mut rng, &chats) else {
            tracing::info!("no chats with other participants, activity generator stopping");
            return;
        };
        if channel.send(activity).is_err() {
            return;
        }
        tokio::time::sleep(tokio::time::Duration::from_millis(millis)).await;
    }
}

/// Returns the next activity and the delay in milliseconds before the one after it.
pub fn generate_activity<R: Rng + ?Sized>(rng: &mut R, chats: &[Chat]) -> Option<(Activity, u64)> {
    const MIN_MESSAGE_WORDS: usize = 1;
    const MAX_MESSAGE_WORDS: usize = 15;
    const PRESENCE_PROBABILITY: f64 = 0.125;

    let chat = chats
        .iter()
        .filter(|chat| chat.counterpart_id().is_some())
        .collect::<Vec<_>>()
        .choose(rng)
        .copied()?;
    let sender = chat
        .participants
        .iter()
        .filter(|id| &***id != CURRENT_USER)
        .collect::<Vec<_>>()
        .choose(rng)
        .copied()?
        .clone();

    let activity = if rng.gen_bool(PRESENCE_PROBABILITY) {
        Activity::Presence {
            user_id: sender,
            online: rng.gen(),
        }
    } else {
        let message_len = rng.gen_range(MIN_MESSAGE_WORDS..=MAX_MESSAGE_WORDS);
        Activity::Message {
            chat_id: chat.id.clone(),
            sender_id: sender,
            content: lipsum::lipsum_words_with_rng(&mut *rng, message_len).into(),
        }
    };
    let millis = rng.gen_range(0..5000);
    Some((activity, millis))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{DateTime, Utc};
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    fn epoch() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn chats() -> Vec<Chat> {
        vec![
            Chat::direct("chat1", "user1", epoch()),
            Chat::group(
                "group",
                ["user2", "user3"].map(Arc::<str>::from),
                "Friends",
                epoch(),
            ),
        ]
    }

    #[test]
    fn activity_comes_from_other_participants() {
        let mut rng = StdRng::seed_from_u64(9);
        let chats = chats();
        for _ in 0..200 {
            let (activity, millis) = generate_activity(&mut rng, &chats).unwrap();
            assert!(millis < 5000);
            match activity {
                Activity::Message {
                    chat_id,
                    sender_id,
                    content,
                } => {
                    let chat = chats.iter().find(|chat| chat.id == chat_id).unwrap();
                    assert!(chat.participants.contains(&sender_id));
                    assert_ne!(&*sender_id, CURRENT_USER);
                    let words = content.split_whitespace().count();
                    assert!((1..=15).contains(&words), "{words} words");
                }
                Activity::Presence { user_id, .. } => {
                    assert_ne!(&*user_id, CURRENT_USER);
                }
            }
        }
    }

    #[test]
    fn nothing_to_generate_without_counterparts() {
        let mut rng = StdRng::seed_from_u64(9);
        assert_eq!(generate_activity(&mut rng, &[]), None);

        let lonely = Chat::group("g", [Arc::<str>::from(CURRENT_USER)], "Me", epoch());
        assert_eq!(generate_activity(&mut rng, &[lonely]), None);
    }

    #[tokio::test(start_paused = true)]
    async fn sender_delivers_until_receiver_dropped() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(activity_sender(tx, chats(), StdRng::seed_from_u64(1)));

        for _ in 0..3 {
            assert!(rx.recv().await.is_some());
        }
        drop(rx);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn sender_stops_without_chats() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        activity_sender(tx, Vec::new(), StdRng::seed_from_u64(1)).await;
        assert_eq!(rx.recv().await, None);
    }
}
