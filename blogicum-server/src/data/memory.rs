//! In-memory repositories backing the service tests.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::category_repository::CategoryRepository;
use super::comment_repository::{CommentRepository, NewComment};
use super::post_repository::{NewPost, PostPatch, PostRepository, PostScope};
use super::user_repository::{NewUser, ProfilePatch, UserCredentials, UserRepository};
use crate::domain::category::{Category, CategoryRef, LocationRef};
use crate::domain::comment::{Comment, CommentView};
use crate::domain::error::DomainError;
use crate::domain::pagination::Pagination;
use crate::domain::post::{AuthorRef, Post, PostView};
use crate::domain::user::User;

#[derive(Default)]
struct Store {
    next_id: i64,
    users: Vec<UserCredentials>,
    categories: Vec<Category>,
    locations: Vec<LocationRef>,
    posts: Vec<Post>,
    comments: Vec<Comment>,
}

impl Store {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn view(&self, post: &Post) -> PostView {
        let username = self
            .users
            .iter()
            .find(|creds| creds.user.id == post.author_id)
            .map(|creds| creds.user.username.clone())
            .unwrap_or_default();
        let category = post.category_id.and_then(|id| {
            self.categories
                .iter()
                .find(|category| category.id == id)
                .map(|category| CategoryRef {
                    id: category.id,
                    title: category.title.clone(),
                    slug: category.slug.clone(),
                    is_published: category.is_published,
                })
        });
        let location = post
            .location_id
            .and_then(|id| self.locations.iter().find(|location| location.id == id))
            .cloned();
        let comment_count = self
            .comments
            .iter()
            .filter(|comment| comment.post_id == post.id)
            .count() as i64;

        PostView {
            post: post.clone(),
            author: AuthorRef {
                id: post.author_id,
                username,
            },
            category,
            location,
            comment_count,
        }
    }

    fn scoped(&self, scope: PostScope, now: DateTime<Utc>) -> Vec<PostView> {
        let mut views: Vec<PostView> = self
            .posts
            .iter()
            .map(|post| self.view(post))
            .filter(|view| match scope {
                PostScope::Public => view.is_publicly_visible(now),
                PostScope::Category { category_id } => {
                    view.post.category_id == Some(category_id) && view.is_publicly_visible(now)
                }
                PostScope::Author {
                    author_id,
                    include_hidden,
                } => {
                    view.post.author_id == author_id
                        && (include_hidden || view.is_publicly_visible(now))
                }
            })
            .collect();
        views.sort_by(|a, b| {
            b.post
                .pub_date
                .cmp(&a.post.pub_date)
                .then(b.post.id.cmp(&a.post.id))
        });
        views
    }
}

#[derive(Clone, Default)]
pub(crate) struct InMemoryBlog {
    store: Arc<Mutex<Store>>,
}

impl InMemoryBlog {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().expect("store mutex poisoned")
    }

    pub(crate) fn add_user(&self, username: &str) -> User {
        let mut store = self.lock();
        let id = store.next_id();
        let user = User::new(id, username, "", "", "", Utc::now()).expect("seed user must be valid");
        store.users.push(UserCredentials {
            user: user.clone(),
            password_hash: String::new(),
        });
        user
    }

    pub(crate) fn add_category(&self, slug: &str, is_published: bool) -> Category {
        let mut store = self.lock();
        let id = store.next_id();
        let category = Category {
            id,
            title: slug.to_uppercase(),
            description: format!("all about {slug}"),
            slug: slug.to_string(),
            is_published,
        };
        store.categories.push(category.clone());
        category
    }

    pub(crate) fn set_category_published(&self, id: i64, is_published: bool) {
        let mut store = self.lock();
        if let Some(category) = store.categories.iter_mut().find(|c| c.id == id) {
            category.is_published = is_published;
        }
    }

    pub(crate) fn add_location(&self, name: &str) -> LocationRef {
        let mut store = self.lock();
        let id = store.next_id();
        let location = LocationRef {
            id,
            name: name.to_string(),
        };
        store.locations.push(location.clone());
        location
    }

    pub(crate) fn add_post(
        &self,
        author_id: i64,
        category_id: Option<i64>,
        is_published: bool,
        pub_date: DateTime<Utc>,
    ) -> Post {
        let mut store = self.lock();
        let id = store.next_id();
        let post = Post {
            id,
            title: format!("post {id}"),
            text: "text".to_string(),
            image: None,
            pub_date,
            is_published,
            author_id,
            category_id,
            location_id: None,
            created_at: Utc::now(),
        };
        store.posts.push(post.clone());
        post
    }

    pub(crate) fn add_comment(&self, post_id: i64, author_id: i64, is_published: bool) -> Comment {
        let mut store = self.lock();
        let id = store.next_id();
        let comment = Comment {
            id,
            text: format!("comment {id}"),
            is_published,
            post_id,
            author_id,
            created_at: Utc::now(),
        };
        store.comments.push(comment.clone());
        comment
    }

    pub(crate) fn post(&self, id: i64) -> Option<Post> {
        self.lock().posts.iter().find(|post| post.id == id).cloned()
    }

    pub(crate) fn comment(&self, id: i64) -> Option<Comment> {
        self.lock()
            .comments
            .iter()
            .find(|comment| comment.id == id)
            .cloned()
    }

    pub(crate) fn password_hash(&self, username: &str) -> Option<String> {
        self.lock()
            .users
            .iter()
            .find(|creds| creds.user.username == username)
            .map(|creds| creds.password_hash.clone())
    }
}

#[async_trait]
impl PostRepository for InMemoryBlog {
    async fn create_post(&self, input: NewPost) -> Result<Post, DomainError> {
        let mut store = self.lock();
        let id = store.next_id();
        let post = Post {
            id,
            title: input.title,
            text: input.text,
            image: input.image,
            pub_date: input.pub_date,
            is_published: true,
            author_id: input.author_id,
            category_id: Some(input.category_id),
            location_id: input.location_id,
            created_at: Utc::now(),
        };
        store.posts.push(post.clone());
        Ok(post)
    }

    async fn get_post(&self, id: i64) -> Result<Option<Post>, DomainError> {
        Ok(self.post(id))
    }

    async fn get_post_view(&self, id: i64) -> Result<Option<PostView>, DomainError> {
        let store = self.lock();
        Ok(store
            .posts
            .iter()
            .find(|post| post.id == id)
            .map(|post| store.view(post)))
    }

    async fn update_post_owned(
        &self,
        post_id: i64,
        owner_id: i64,
        patch: PostPatch,
    ) -> Result<Option<Post>, DomainError> {
        let mut store = self.lock();
        let Some(post) = store
            .posts
            .iter_mut()
            .find(|post| post.id == post_id && post.author_id == owner_id)
        else {
            return Ok(None);
        };
        post.title = patch.title;
        post.text = patch.text;
        post.image = patch.image;
        post.pub_date = patch.pub_date;
        post.category_id = Some(patch.category_id);
        post.location_id = patch.location_id;
        Ok(Some(post.clone()))
    }

    async fn delete_post_owned(&self, post_id: i64, owner_id: i64) -> Result<bool, DomainError> {
        let mut store = self.lock();
        let before = store.posts.len();
        store
            .posts
            .retain(|post| !(post.id == post_id && post.author_id == owner_id));
        let deleted = store.posts.len() < before;
        if deleted {
            store.comments.retain(|comment| comment.post_id != post_id);
        }
        Ok(deleted)
    }

    async fn list_posts(
        &self,
        scope: PostScope,
        now: DateTime<Utc>,
        pagination: Pagination,
    ) -> Result<Vec<PostView>, DomainError> {
        Ok(self
            .lock()
            .scoped(scope, now)
            .into_iter()
            .skip(pagination.offset() as usize)
            .take(pagination.limit() as usize)
            .collect())
    }

    async fn count_posts(&self, scope: PostScope, now: DateTime<Utc>) -> Result<i64, DomainError> {
        Ok(self.lock().scoped(scope, now).len() as i64)
    }
}

#[async_trait]
impl CommentRepository for InMemoryBlog {
    async fn create_comment(&self, input: NewComment) -> Result<Comment, DomainError> {
        let mut store = self.lock();
        if !store.posts.iter().any(|post| post.id == input.post_id) {
            return Err(DomainError::NotFound("post".to_string()));
        }
        let id = store.next_id();
        let comment = Comment {
            id,
            text: input.text,
            is_published: true,
            post_id: input.post_id,
            author_id: input.author_id,
            created_at: Utc::now(),
        };
        store.comments.push(comment.clone());
        Ok(comment)
    }

    async fn get_comment(&self, id: i64) -> Result<Option<Comment>, DomainError> {
        Ok(self.comment(id))
    }

    async fn update_comment_owned(
        &self,
        comment_id: i64,
        owner_id: i64,
        text: String,
    ) -> Result<Option<Comment>, DomainError> {
        let mut store = self.lock();
        let Some(comment) = store
            .comments
            .iter_mut()
            .find(|comment| comment.id == comment_id && comment.author_id == owner_id)
        else {
            return Ok(None);
        };
        comment.text = text;
        Ok(Some(comment.clone()))
    }

    async fn delete_comment_owned(
        &self,
        comment_id: i64,
        owner_id: i64,
    ) -> Result<bool, DomainError> {
        let mut store = self.lock();
        let before = store.comments.len();
        store
            .comments
            .retain(|comment| !(comment.id == comment_id && comment.author_id == owner_id));
        Ok(store.comments.len() < before)
    }

    async fn list_published_comments(
        &self,
        post_id: i64,
    ) -> Result<Vec<CommentView>, DomainError> {
        let store = self.lock();
        let mut comments: Vec<CommentView> = store
            .comments
            .iter()
            .filter(|comment| comment.post_id == post_id && comment.is_published)
            .map(|comment| CommentView {
                comment: comment.clone(),
                author: AuthorRef {
                    id: comment.author_id,
                    username: store
                        .users
                        .iter()
                        .find(|creds| creds.user.id == comment.author_id)
                        .map(|creds| creds.user.username.clone())
                        .unwrap_or_default(),
                },
            })
            .collect();
        comments.sort_by(|a, b| {
            a.comment
                .created_at
                .cmp(&b.comment.created_at)
                .then(a.comment.id.cmp(&b.comment.id))
        });
        Ok(comments)
    }
}

#[async_trait]
impl CategoryRepository for InMemoryBlog {
    async fn find_published_by_slug(&self, slug: &str) -> Result<Option<Category>, DomainError> {
        Ok(self
            .lock()
            .categories
            .iter()
            .find(|category| category.slug == slug && category.is_published)
            .cloned())
    }

    async fn category_exists(&self, id: i64) -> Result<bool, DomainError> {
        Ok(self.lock().categories.iter().any(|category| category.id == id))
    }

    async fn location_exists(&self, id: i64) -> Result<bool, DomainError> {
        Ok(self.lock().locations.iter().any(|location| location.id == id))
    }
}

#[async_trait]
impl UserRepository for InMemoryBlog {
    async fn create_user(&self, input: NewUser) -> Result<User, DomainError> {
        let mut store = self.lock();
        if store
            .users
            .iter()
            .any(|creds| creds.user.username == input.username)
        {
            return Err(DomainError::AlreadyExists("username".to_string()));
        }
        let id = store.next_id();
        let user = User::new(id, input.username, "", "", "", Utc::now())?;
        store.users.push(UserCredentials {
            user: user.clone(),
            password_hash: input.password_hash,
        });
        Ok(user)
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserCredentials>, DomainError> {
        Ok(self
            .lock()
            .users
            .iter()
            .find(|creds| creds.user.username == username)
            .cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, DomainError> {
        Ok(self
            .lock()
            .users
            .iter()
            .find(|creds| creds.user.id == id)
            .map(|creds| creds.user.clone()))
    }

    async fn update_profile(
        &self,
        id: i64,
        patch: ProfilePatch,
    ) -> Result<Option<User>, DomainError> {
        let mut store = self.lock();
        if store
            .users
            .iter()
            .any(|creds| creds.user.username == patch.username && creds.user.id != id)
        {
            return Err(DomainError::AlreadyExists("username".to_string()));
        }
        let Some(creds) = store.users.iter_mut().find(|creds| creds.user.id == id) else {
            return Ok(None);
        };
        creds.user.username = patch.username;
        creds.user.email = patch.email;
        creds.user.first_name = patch.first_name;
        creds.user.last_name = patch.last_name;
        Ok(Some(creds.user.clone()))
    }
}
