//! Delivery queue properties under random failures.

use proptest::prelude::*;
use tillsync_queue::{DeliveryQueue, QueueConfig, QueuePhase, RecordingSink};

fn paused_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_every_write_is_delivered_once_in_order(
        first in prop::collection::vec(any::<u32>(), 1..8),
        second in prop::collection::vec(any::<u32>(), 0..8),
        failures in 0usize..4,
    ) {
        let rt = paused_runtime();
        let (delivered, phase) = rt.block_on(async {
            let sink = RecordingSink::new();
            sink.fail_next(failures);
            let queue = DeliveryQueue::new(sink.clone(), QueueConfig::default());

            let mut deliveries: Vec<_> = first.iter().map(|&p| queue.write(p)).collect();
            tokio::task::yield_now().await;
            deliveries.extend(second.iter().map(|&p| queue.write(p)));

            for delivery in deliveries {
                delivery.await.unwrap();
            }
            (sink.delivered(), queue.phase())
        });

        let expected: Vec<u32> = first.iter().chain(&second).copied().collect();
        prop_assert_eq!(delivered, expected);
        prop_assert_eq!(phase, QueuePhase::Idle);
    }

    #[test]
    fn test_restored_payloads_go_out_before_new_writes(
        saved in prop::collection::vec(any::<u32>(), 1..6),
        fresh in prop::collection::vec(any::<u32>(), 0..6),
    ) {
        let rt = paused_runtime();
        let delivered = rt.block_on(async {
            let sink = RecordingSink::new();
            let queue = DeliveryQueue::new(sink.clone(), QueueConfig::default());

            let restored = queue.restore(saved.clone());
            let writes: Vec<_> = fresh.iter().map(|&p| queue.write(p)).collect();
            restored.await.unwrap();
            for write in writes {
                write.await.unwrap();
            }
            sink.delivered()
        });

        let expected: Vec<u32> = saved.iter().chain(&fresh).copied().collect();
        prop_assert_eq!(delivered, expected);
    }
}
