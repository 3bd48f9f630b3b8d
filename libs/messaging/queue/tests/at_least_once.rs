use message_queue::{in_memory_queue, MessageConsumer, MessageQueue};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn waiting_consumer_wakes_on_publish() {
    let (queue, consumer) = in_memory_queue(16);
    let consumer = Arc::new(consumer);

    let waiter = {
        let consumer = Arc::clone(&consumer);
        tokio::spawn(async move { consumer.receive().await })
    };

    tokio::time::sleep(Duration::from_millis(20)).await;
    queue.publish(b"late".to_vec()).await.unwrap();

    let delivery = tokio::time::timeout(Duration::from_secs(1), waiter)
        .await
        .expect("consumer woke up")
        .expect("task panicked")
        .unwrap()
        .unwrap();
    assert_eq!(delivery.payload, b"late");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn every_message_delivered_until_acked() {
    let (queue, consumer) = in_memory_queue(256);
    let queue = Arc::new(queue);

    let publishers: Vec<_> = (0..4u8)
        .map(|p| {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move {
                for i in 0..25u8 {
                    queue.publish(vec![p, i]).await.unwrap();
                }
            })
        })
        .collect();
    for publisher in publishers {
        publisher.await.unwrap();
    }
    drop(queue);

    // Nack every first attempt so each message is delivered twice
    let mut seen = HashSet::new();
    let mut deliveries = 0;
    while let Some(delivery) = consumer.receive().await.unwrap() {
        deliveries += 1;
        if delivery.attempt == 1 {
            consumer.nack(delivery.delivery_id).await.unwrap();
        } else {
            seen.insert(delivery.payload.clone());
            consumer.ack(delivery.delivery_id).await.unwrap();
        }
    }

    assert_eq!(seen.len(), 100);
    assert_eq!(deliveries, 200);
    assert_eq!(consumer.in_flight_count(), 0);
}
