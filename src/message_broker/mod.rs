/// Kafka 기반 변경 알림 전파
/// 인스턴스마다 별도 컨슈머 그룹으로 구독해서 모든 인스턴스가 모든 변경을 받는다.
/// 자신이 발행한 변경은 이미 로컬 허브에 전달했으므로 다시 전달하지 않는다.
// region:    --- Imports
use crate::error::AppError;
use crate::notify::{ChangeEvent, ChangeHub, ChangeNotifier};
use async_trait::async_trait;
use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
use rdkafka::client::DefaultClientContext;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::message::Message;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::ClientConfig;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

// endregion: --- Imports

pub const CHANGES_TOPIC: &str = "auction-changes";

/// 브로커로 전달되는 변경 (발행 인스턴스 표시 포함)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEnvelope {
    pub origin: String,
    pub event: ChangeEvent,
}

// region:    --- Kafka Producer
#[derive(Clone)]
pub struct KafkaProducer {
    producer: Arc<FutureProducer>,
}

impl KafkaProducer {
    pub fn new(brokers: &str) -> Result<Self, AppError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create()
            .map_err(|e| AppError::unavailable(format!("Kafka 프로듀서 생성 실패: {:?}", e)))?;

        Ok(KafkaProducer {
            producer: Arc::new(producer),
        })
    }

    /// 메시지 전송
    pub async fn send_message(&self, topic: &str, key: &str, value: &str) -> Result<(), AppError> {
        debug!(
            "{:<12} --> Kafka 메시지 전송: topic={}, key={}",
            "Producer", topic, key
        );
        let record = FutureRecord::to(topic).key(key).payload(value);

        self.producer
            .send(record, Duration::from_secs(0))
            .await
            .map_err(|(e, _)| AppError::unavailable(format!("Kafka 전송 실패: {:?}", e)))?;

        Ok(())
    }
}
// endregion: --- Kafka Producer

// region:    --- Kafka Consumer
pub struct KafkaConsumer {
    consumer: StreamConsumer,
}

impl KafkaConsumer {
    pub fn new(brokers: &str, group_id: &str) -> Result<Self, AppError> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("group.id", group_id)
            .set("enable.auto.commit", "true")
            // 지난 변경은 필요 없다. 구독 이후의 변경만 받는다.
            .set("auto.offset.reset", "latest")
            .set("session.timeout.ms", "6000")
            .set("allow.auto.create.topics", "true")
            .create()
            .map_err(|e| AppError::unavailable(format!("Kafka 컨슈머 생성 실패: {:?}", e)))?;

        Ok(KafkaConsumer { consumer })
    }

    /// 변경 수신 루프. 받은 변경마다 handler를 호출한다.
    pub async fn consume_changes<F>(&self, topic: &str, handler: F) -> Result<(), AppError>
    where
        F: Fn(ChangeEnvelope) + Send,
    {
        info!("{:<12} --> Kafka 변경 구독 시작: topic={}", "Consumer", topic);
        self.consumer
            .subscribe(&[topic])
            .map_err(|e| AppError::unavailable(format!("Kafka 구독 실패: {:?}", e)))?;

        loop {
            match self.consumer.recv().await {
                Ok(message) => {
                    debug!(
                        "{:<12} --> 메시지 수신: partition={}, offset={}",
                        "Consumer",
                        message.partition(),
                        message.offset()
                    );

                    match message.payload() {
                        Some(payload) => match serde_json::from_slice::<ChangeEnvelope>(payload) {
                            Ok(envelope) => handler(envelope),
                            Err(e) => error!("{:<12} --> deserialize 오류: {:?}", "Consumer", e),
                        },
                        None => warn!("{:<12} --> 빈 페이로드 수신", "Consumer"),
                    }
                }
                Err(e) => error!("{:<12} --> 메시지 수신 오류: {:?}", "Consumer", e),
            }
        }
    }
}
// endregion: --- Kafka Consumer

// region:    --- Kafka Notifier
/// 로컬 허브 전달 + Kafka 발행
#[derive(Clone)]
pub struct KafkaNotifier {
    producer: KafkaProducer,
    hub: ChangeHub,
    origin: String,
}

impl KafkaNotifier {
    pub fn new(producer: KafkaProducer, hub: ChangeHub, origin: impl Into<String>) -> Self {
        Self {
            producer,
            hub,
            origin: origin.into(),
        }
    }
}

#[async_trait]
impl ChangeNotifier for KafkaNotifier {
    async fn publish(&self, event: ChangeEvent) -> Result<(), AppError> {
        self.hub.publish_local(event.clone());

        let key = event.topic().key();
        let envelope = ChangeEnvelope {
            origin: self.origin.clone(),
            event,
        };
        let payload = serde_json::to_string(&envelope)
            .map_err(|e| AppError::unavailable(format!("변경 직렬화 실패: {:?}", e)))?;

        // 브로커 응답을 기다리지 않는다. 로컬 구독자는 이미 받았다.
        let producer = self.producer.clone();
        tokio::spawn(async move {
            if let Err(e) = producer.send_message(CHANGES_TOPIC, &key, &payload).await {
                warn!("{:<12} --> 변경 발행 실패 (key {}): {}", "Notifier", key, e);
            }
        });
        Ok(())
    }
}
// endregion: --- Kafka Notifier

// region:    --- Kafka Manager
pub struct KafkaManager {
    producer: KafkaProducer,
    brokers: String,
    instance_id: String,
}

impl KafkaManager {
    pub fn new(brokers: &str) -> Result<Self, AppError> {
        let instance_id = uuid::Uuid::new_v4().to_string();
        info!(
            "{:<12} --> Kafka 연결 준비: brokers={}, instance={}",
            "Manager", brokers, instance_id
        );
        Ok(KafkaManager {
            producer: KafkaProducer::new(brokers)?,
            brokers: brokers.to_string(),
            instance_id,
        })
    }

    pub fn notifier(&self, hub: ChangeHub) -> KafkaNotifier {
        KafkaNotifier::new(self.producer.clone(), hub, self.instance_id.clone())
    }

    /// 다른 인스턴스가 발행한 변경을 로컬 허브로 전달하는 작업 시작
    pub fn start_bridge(&self, hub: ChangeHub) -> Result<tokio::task::JoinHandle<()>, AppError> {
        let group_id = format!("{}-{}", CHANGES_TOPIC, self.instance_id);
        let consumer = KafkaConsumer::new(&self.brokers, &group_id)?;
        let origin = self.instance_id.clone();
        Ok(tokio::spawn(async move {
            let result = consumer
                .consume_changes(CHANGES_TOPIC, move |envelope| {
                    if envelope.origin != origin {
                        hub.publish_local(envelope.event);
                    }
                })
                .await;
            if let Err(e) = result {
                error!("{:<12} --> 변경 수신 중단: {:?}", "Manager", e);
            }
        }))
    }

    /// 토픽 생성
    pub async fn create_topic(
        &self,
        topic_name: &str,
        num_partitions: i32,
        replication_factor: i32,
    ) -> Result<(), AppError> {
        info!("{:<12} --> Kafka 토픽 생성 시작: {}", "Manager", topic_name);

        let admin_client: AdminClient<DefaultClientContext> = ClientConfig::new()
            .set("bootstrap.servers", &self.brokers)
            .create()
            .map_err(|e| AppError::unavailable(format!("AdminClient 생성 실패: {:?}", e)))?;

        let new_topic = NewTopic::new(
            topic_name,
            num_partitions,
            TopicReplication::Fixed(replication_factor),
        );

        // 이미 있는 토픽은 결과 목록의 개별 오류로 온다
        let results = admin_client
            .create_topics(&[new_topic], &AdminOptions::new())
            .await
            .map_err(|e| AppError::unavailable(format!("토픽 생성 실패: {:?}", e)))?;
        for result in results {
            match result {
                Ok(name) => info!("{:<12} --> Kafka 토픽 생성 성공: {}", "Manager", name),
                Err((name, code)) => {
                    warn!("{:<12} --> Kafka 토픽 생성 건너뜀: {} ({:?})", "Manager", name, code)
                }
            }
        }
        Ok(())
    }
}
// endregion: --- Kafka Manager

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn envelope_carries_origin_and_event() {
        let envelope = ChangeEnvelope {
            origin: "instance-a".into(),
            event: ChangeEvent::AuctionFinished {
                auction_id: 3,
                timestamp: Utc::now(),
            },
        };
        let json = serde_json::to_string(&envelope).unwrap();
        let parsed: ChangeEnvelope = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.origin, "instance-a");
        assert_eq!(parsed.event, envelope.event);
        assert_eq!(parsed.event.topic().key(), "auctions/3");
    }

    /// 브로커가 없어도 발행은 즉시 끝나고 로컬 구독자는 변경을 받는다
    #[tokio::test]
    async fn publish_does_not_wait_for_broker() {
        let hub = ChangeHub::default();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let _subscription = hub.subscribe(crate::notify::Topic::All, move |event| {
            let _ = tx.send(event);
        });
        let producer = KafkaProducer::new("127.0.0.1:9").unwrap();
        let notifier = KafkaNotifier::new(producer, hub, "instance-a");

        let event = ChangeEvent::AuctionFinished {
            auction_id: 7,
            timestamp: Utc::now(),
        };
        tokio::time::timeout(Duration::from_secs(1), notifier.publish(event.clone()))
            .await
            .expect("발행이 브로커 응답을 기다림")
            .unwrap();

        let received = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(received, event);
    }
}
