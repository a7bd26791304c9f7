use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, Method, StatusCode, Uri},
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub user_id: u64,
    pub id: u64,
    pub title: String,
    pub body: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub post_id: u64,
    pub id: u64,
    pub email: String,
    pub body: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub user_id: u64,
    pub title: String,
    #[serde(default)]
    pub body: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPatch {
    pub user_id: Option<u64>,
    pub title: Option<String>,
    pub body: Option<String>,
}

#[derive(Default)]
pub struct Store {
    posts: BTreeMap<u64, Post>,
    comments: Vec<Comment>,
    next_id: u64,
}

pub type Db = Arc<RwLock<Store>>;

impl Store {
    /// Three posts by two users, two comments on the first post.
    pub fn seeded() -> Self {
        let posts = (1..=3)
            .map(|id| {
                let post = Post {
                    user_id: if id < 3 { 1 } else { 2 },
                    id,
                    title: format!("post {id}"),
                    body: format!("body of post {id}"),
                };
                (id, post)
            })
            .collect();
        let comments = (1..=2)
            .map(|id| Comment {
                post_id: 1,
                id,
                email: format!("reader{id}@example.test"),
                body: format!("comment {id}"),
            })
            .collect();
        Self {
            posts,
            comments,
            next_id: 4,
        }
    }
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::seeded()));
    Router::new()
        .route("/posts", get(list_posts).post(create_post))
        .route(
            "/posts/{id}",
            get(get_post)
                .put(replace_post)
                .patch(update_post)
                .delete(delete_post),
        )
        .route("/comments", get(list_comments))
        .route("/echo", any(echo))
        .route("/error", get(error))
        .route("/empty", get(empty))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// Filters arrive as raw strings so a malformed value yields an empty list
/// rather than a rejection.
fn parse_filter(query: &BTreeMap<String, String>, key: &str) -> Option<Result<u64, ()>> {
    query.get(key).map(|raw| raw.parse().map_err(|_| ()))
}

async fn list_posts(
    State(db): State<Db>,
    Query(query): Query<BTreeMap<String, String>>,
) -> Json<Vec<Post>> {
    let store = db.read().await;
    let posts = match parse_filter(&query, "userId") {
        None => store.posts.values().cloned().collect(),
        Some(Ok(user_id)) => store
            .posts
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect(),
        Some(Err(())) => Vec::new(),
    };
    Json(posts)
}

async fn create_post(State(db): State<Db>, Json(input): Json<NewPost>) -> (StatusCode, Json<Post>) {
    let mut store = db.write().await;
    let post = Post {
        user_id: input.user_id,
        id: store.next_id,
        title: input.title,
        body: input.body,
    };
    store.next_id += 1;
    store.posts.insert(post.id, post.clone());
    (StatusCode::CREATED, Json(post))
}

async fn get_post(State(db): State<Db>, Path(id): Path<u64>) -> Result<Json<Post>, (StatusCode, Json<Value>)> {
    let store = db.read().await;
    store.posts.get(&id).cloned().map(Json).ok_or_else(not_found)
}

async fn replace_post(
    State(db): State<Db>,
    Path(id): Path<u64>,
    Json(input): Json<NewPost>,
) -> Result<Json<Post>, (StatusCode, Json<Value>)> {
    let mut store = db.write().await;
    let post = store.posts.get_mut(&id).ok_or_else(not_found)?;
    post.user_id = input.user_id;
    post.title = input.title;
    post.body = input.body;
    Ok(Json(post.clone()))
}

async fn update_post(
    State(db): State<Db>,
    Path(id): Path<u64>,
    Json(input): Json<PostPatch>,
) -> Result<Json<Post>, (StatusCode, Json<Value>)> {
    let mut store = db.write().await;
    let post = store.posts.get_mut(&id).ok_or_else(not_found)?;
    if let Some(user_id) = input.user_id {
        post.user_id = user_id;
    }
    if let Some(title) = input.title {
        post.title = title;
    }
    if let Some(body) = input.body {
        post.body = body;
    }
    Ok(Json(post.clone()))
}

async fn delete_post(State(db): State<Db>, Path(id): Path<u64>) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let mut store = db.write().await;
    store.posts.remove(&id).ok_or_else(not_found)?;
    store.comments.retain(|c| c.post_id != id);
    Ok(Json(json!({})))
}

async fn list_comments(
    State(db): State<Db>,
    Query(query): Query<BTreeMap<String, String>>,
) -> Json<Vec<Comment>> {
    let store = db.read().await;
    let comments = match parse_filter(&query, "postId") {
        None => store.comments.clone(),
        Some(Ok(post_id)) => store
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect(),
        Some(Err(())) => Vec::new(),
    };
    Json(comments)
}

/// Reflect the request back so clients can inspect what was actually sent.
async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: String) -> Json<Value> {
    let mut header_map: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in &headers {
        header_map
            .entry(name.as_str().to_string())
            .or_default()
            .push(value.to_str().unwrap_or_default().to_string());
    }
    let json_body = serde_json::from_str::<Value>(&body).ok();
    Json(json!({
        "method": method.as_str(),
        "path": uri.path(),
        "query": uri.query(),
        "headers": header_map,
        "body": body,
        "json": json_body,
    }))
}

async fn error() -> Json<Value> {
    Json(json!({ "error": "something went wrong" }))
}

async fn empty() -> StatusCode {
    StatusCode::NO_CONTENT
}

fn not_found() -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({})))
}
