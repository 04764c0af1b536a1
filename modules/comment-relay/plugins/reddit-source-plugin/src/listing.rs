//! Wire shapes of the Reddit JSON API.
//!
//! Only the fields the relay uses are modelled; everything else is ignored.

use comment_relay_sdk::{Comment, Post};
use serde::Deserialize;
use serde::de::IgnoredAny;

#[derive(Debug, Deserialize)]
pub(crate) struct Listing<T> {
    pub data: ListingData<T>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListingData<T> {
    #[serde(default = "Vec::new")]
    pub children: Vec<T>,
}

/// `{"kind": "...", "data": {...}}` wrapper whose kind is not inspected.
#[derive(Debug, Deserialize)]
pub(crate) struct Thing<T> {
    pub data: T,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct PostData {
    pub id: String,
    pub title: String,
    pub subreddit: String,
    pub author: String,
    pub permalink: String,
    pub num_comments: u64,
}

/// Child of a comment listing. `more` entries are placeholders for replies
/// that were not expanded and carry no comment body.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", content = "data")]
pub(crate) enum CommentThing {
    #[serde(rename = "t1")]
    Comment(Box<CommentData>),
    #[serde(rename = "more")]
    More(IgnoredAny),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct CommentData {
    pub id: String,
    pub author: String,
    pub body: String,
    pub replies: Replies,
}

/// A comment without replies carries `""` instead of an empty listing.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Replies {
    Listing(Listing<CommentThing>),
    Empty(IgnoredAny),
}

impl Default for Replies {
    fn default() -> Self {
        Self::Empty(IgnoredAny)
    }
}

/// `GET /comments/{id}` answers with the post listing followed by the comment listing.
pub(crate) type PostWithComments = (Listing<Thing<PostData>>, Listing<CommentThing>);

impl From<PostData> for Post {
    fn from(data: PostData) -> Self {
        Self {
            id: data.id,
            title: data.title,
            subreddit: data.subreddit,
            author: data.author,
            permalink: data.permalink,
            num_comments: data.num_comments,
            comments: Vec::new(),
        }
    }
}

/// Convert a comment listing into the comment tree, dropping `more` placeholders.
pub(crate) fn comment_tree(listing: Listing<CommentThing>) -> Vec<Comment> {
    listing
        .data
        .children
        .into_iter()
        .filter_map(|thing| match thing {
            CommentThing::Comment(data) => Some(comment(*data)),
            CommentThing::More(_) => None,
        })
        .collect()
}

fn comment(data: CommentData) -> Comment {
    let replies = match data.replies {
        Replies::Listing(listing) => comment_tree(listing),
        Replies::Empty(_) => Vec::new(),
    };
    Comment {
        id: data.id,
        author: data.author,
        body: data.body,
        replies,
    }
}
