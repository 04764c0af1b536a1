#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use comment_relay::domain::{FetchService, PublishPipeline};
use comment_relay::{Gateway, GatewayConfig};
use comment_relay_sdk::{
    AckSender, BrokerError, Comment, ContentSource, ContentSourceError, DeliveryAck,
    DeliveryProducer, OutboundRecord, Post, SearchOptions,
};

pub const FETCH_PATH: &str = "/reddit_implementation.RedditService/GetPostComments";
pub const SEND_PATH: &str = "/reddit_implementation.RedditService/SendRedditComment";

/// Content source serving a fixed set of posts; every post has the same comments.
#[derive(Default)]
pub struct StaticSource {
    pub posts: Vec<Post>,
    pub comments: Vec<Comment>,
    /// Delay before every search answers.
    pub stall: Option<Duration>,
}

impl StaticSource {
    pub fn arboretum() -> Self {
        Self {
            posts: vec![
                post("abc123", "Arboretum at night?"),
                post("def456", "Arboretum parking"),
            ],
            comments: vec![
                comment("It closes at sunset.", vec![comment("Not in summer.", vec![])]),
                comment("Bring a flashlight.", vec![]),
            ],
            stall: None,
        }
    }

    pub fn stalled(delay: Duration) -> Self {
        Self {
            stall: Some(delay),
            ..Self::arboretum()
        }
    }
}

#[async_trait]
impl ContentSource for StaticSource {
    async fn search_posts(
        &self,
        _query: &str,
        _community: &str,
        options: SearchOptions,
    ) -> Result<Vec<Post>, ContentSourceError> {
        if let Some(delay) = self.stall {
            tokio::time::sleep(delay).await;
        }
        Ok(self
            .posts
            .iter()
            .take(options.limit as usize)
            .cloned()
            .collect())
    }

    async fn get_post_with_comments(&self, post_id: &str) -> Result<Post, ContentSourceError> {
        let mut post = self
            .posts
            .iter()
            .find(|p| p.id == post_id)
            .cloned()
            .ok_or_else(|| ContentSourceError::NotFound(post_id.to_owned()))?;
        post.comments = self.comments.clone();
        Ok(post)
    }
}

/// Producer that acknowledges or fails every record immediately.
pub struct RecordingProducer {
    failure: Option<String>,
    pub records: Mutex<Vec<OutboundRecord>>,
}

impl RecordingProducer {
    pub fn acking() -> Arc<Self> {
        Arc::new(Self {
            failure: None,
            records: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(text: &str) -> Arc<Self> {
        Arc::new(Self {
            failure: Some(text.to_owned()),
            records: Mutex::new(Vec::new()),
        })
    }

    pub fn count(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

impl DeliveryProducer for RecordingProducer {
    fn submit(&self, record: OutboundRecord, ack: AckSender) -> Result<(), BrokerError> {
        let mut records = self.records.lock().unwrap();
        let offset = i64::try_from(records.len()).unwrap();
        records.push(record);
        let report = match &self.failure {
            Some(text) => Err(BrokerError::Delivery(text.clone())),
            None => Ok(DeliveryAck {
                partition: 0,
                offset,
            }),
        };
        let _ = ack.send(report);
        Ok(())
    }
}

pub fn post(id: &str, title: &str) -> Post {
    Post {
        id: id.to_owned(),
        title: title.to_owned(),
        subreddit: "uiuc".to_owned(),
        ..Post::default()
    }
}

pub fn comment(body: &str, replies: Vec<Comment>) -> Comment {
    Comment {
        body: body.to_owned(),
        replies,
        ..Comment::default()
    }
}

pub fn gateway_with(
    cfg: &GatewayConfig,
    source: StaticSource,
    producer: Arc<RecordingProducer>,
) -> Gateway {
    let fetch = Arc::new(FetchService::new(Arc::new(source), cfg.request_timeout));
    let publisher = Arc::new(PublishPipeline::new(
        producer,
        "reddit_comments",
        Duration::from_secs(1),
    ));
    Gateway::new(cfg, fetch, publisher).expect("gateway")
}

pub fn gateway(source: StaticSource, producer: Arc<RecordingProducer>) -> Gateway {
    gateway_with(&GatewayConfig::default(), source, producer)
}
