use std::{collections::HashSet, sync::Arc, time::Duration};

use hubcast::{Broker, BrokerConfig, DeliveryPolicy, ID_ENTROPY_BYTES};

/// Тест проверяет, что 10 000 одновременных регистраций дают 10 000
/// различных подписчиков.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_attach_yields_unique_ids() {
    let broker = Arc::new(Broker::<u64>::new());

    let mut handles = Vec::with_capacity(10_000);
    for _ in 0..10_000 {
        let broker = Arc::clone(&broker);
        handles.push(tokio::spawn(async move { broker.attach() }));
    }

    let mut ids = HashSet::with_capacity(10_000);
    for handle in handles {
        let sub = handle.await.unwrap().unwrap();
        assert_eq!(sub.id().as_str().len(), ID_ENTROPY_BYTES * 2);
        ids.insert(sub.id().clone());
    }

    assert_eq!(ids.len(), 10_000);
    assert_eq!(broker.subscriber_count(), 10_000);
}

/// Тест проверяет, что параллельные подписки и отписки на непересекающиеся
/// топики приводят к тому же состоянию, что и последовательное выполнение.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_subscribe_unsubscribe_disjoint_topics() {
    let broker = Arc::new(Broker::<u64>::new());
    let subs: Vec<_> = (0..16).map(|_| broker.attach().unwrap()).collect();

    let mut handles = Vec::new();
    for (n, sub) in subs.iter().cloned().enumerate() {
        let broker = Arc::clone(&broker);
        handles.push(tokio::spawn(async move {
            let keep = format!("keep-{n}");
            let temp = format!("temp-{n}");
            for _ in 0..200 {
                broker.subscribe(&sub, [&keep, &temp]);
                broker.unsubscribe(&sub, [&temp]);
                tokio::task::yield_now().await;
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    for (n, sub) in subs.iter().enumerate() {
        let keep = format!("keep-{n}");
        let temp = format!("temp-{n}");
        assert_eq!(broker.subscribers(&keep), 1);
        assert_eq!(broker.subscribers(&temp), 0);
        assert_eq!(sub.topics(), vec![keep]);
    }
}

/// Тест проверяет параллельные подписки многих подписчиков на один топик.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_subscribe_same_topic() {
    let broker = Arc::new(Broker::<u64>::new());

    let mut handles = Vec::new();
    for _ in 0..256 {
        let broker = Arc::clone(&broker);
        handles.push(tokio::spawn(async move {
            let sub = broker.attach().unwrap();
            broker.subscribe(&sub, ["shared"]);
            sub
        }));
    }
    let mut subs = Vec::new();
    for handle in handles {
        subs.push(handle.await.unwrap());
    }

    assert_eq!(broker.subscribers("shared"), 256);
    assert!(subs.iter().all(|s| s.has_topic("shared")));
}

/// Тест проверяет, что отключение во время рассылок не зависает и не
/// оставляет подписчика в индексе.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_detach_during_broadcast() {
    let broker = Arc::new(Broker::<u64>::new());
    let victim = broker.attach().unwrap();
    let reader = broker.attach().unwrap();
    broker.subscribe(&victim, ["A", "B"]);
    broker.subscribe(&reader, ["A"]);

    let consumer = {
        let mailbox = reader.messages();
        tokio::spawn(async move {
            let mut n = 0;
            while mailbox.recv().await.is_some() {
                n += 1;
            }
            n
        })
    };

    let publisher = {
        let broker = Arc::clone(&broker);
        tokio::spawn(async move {
            for i in 0..500 {
                broker.broadcast(i, ["A", "B"]);
                tokio::task::yield_now().await;
            }
        })
    };

    tokio::time::sleep(Duration::from_millis(5)).await;
    assert!(broker.detach(&victim).await);
    publisher.await.unwrap();

    assert_eq!(broker.subscribers("A"), 1);
    assert_eq!(broker.subscribers("B"), 0);
    assert!(broker.get(victim.id()).is_none());

    tokio::time::timeout(Duration::from_secs(5), broker.wait_idle())
        .await
        .expect("all deliveries should finish");

    assert!(broker.detach(&reader).await);
    let received = tokio::time::timeout(Duration::from_secs(1), consumer)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(received, 500);
}

/// Тест проверяет, что параллельная подписка не может «воскресить»
/// подписчика в индексе после его отключения.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_subscribe_racing_detach_leaves_no_trace() {
    let broker = Arc::new(Broker::<u64>::with_config(
        BrokerConfig::default().with_delivery(DeliveryPolicy::Bounded { capacity: 4 }),
    ));

    for round in 0..100 {
        let sub = broker.attach().unwrap();
        let topic = format!("race-{round}");

        let subscriber = {
            let broker = Arc::clone(&broker);
            let sub = sub.clone();
            let topic = topic.clone();
            tokio::spawn(async move {
                for _ in 0..10 {
                    broker.subscribe(&sub, [&topic]);
                    tokio::task::yield_now().await;
                }
            })
        };

        broker.detach(&sub).await;
        subscriber.await.unwrap();

        assert_eq!(broker.subscribers(&topic), 0);
        assert!(sub.topics().is_empty());
    }
    assert_eq!(broker.subscriber_count(), 0);
}
