use chrono::Utc;
use tracing::info;

use crate::data::category_repository::CategoryRepository;
use crate::data::comment_repository::CommentRepository;
use crate::data::post_repository::{NewPost, PostPatch, PostRepository, PostScope};
use crate::data::user_repository::UserRepository;
use crate::domain::access::{RedirectTarget, ensure_can_modify};
use crate::domain::category::Category;
use crate::domain::comment::CommentView;
use crate::domain::error::DomainError;
use crate::domain::pagination::{PAGE_SIZE, Page, num_pages, resolve_page};
use crate::domain::post::{ImageChange, Post, PostDraft, PostView, ValidPostDraft};
use crate::domain::user::User;

const INVALID_CHOICE: &str = "Select a valid choice. That choice is not one of the available choices.";

#[derive(Debug, Clone)]
pub(crate) struct PostDetail {
    pub(crate) post: PostView,
    pub(crate) comments: Vec<CommentView>,
}

#[derive(Debug, Clone)]
pub(crate) struct CategoryFeed {
    pub(crate) category: Category,
    pub(crate) page: Page<PostView>,
}

#[derive(Debug, Clone)]
pub(crate) struct ProfileFeed {
    pub(crate) profile: User,
    pub(crate) page: Page<PostView>,
}

/// Listings, post pages and post authoring.
pub(crate) struct BlogService<P, M, C, U>
where
    P: PostRepository,
    M: CommentRepository,
    C: CategoryRepository,
    U: UserRepository,
{
    posts: P,
    comments: M,
    categories: C,
    users: U,
}

impl<P, M, C, U> BlogService<P, M, C, U>
where
    P: PostRepository,
    M: CommentRepository,
    C: CategoryRepository,
    U: UserRepository,
{
    pub(crate) fn new(posts: P, comments: M, categories: C, users: U) -> Self {
        Self {
            posts,
            comments,
            categories,
            users,
        }
    }

    pub(crate) async fn list_public_posts(
        &self,
        page: Option<&str>,
    ) -> Result<Page<PostView>, DomainError> {
        self.paginate(PostScope::Public, page).await
    }

    pub(crate) async fn list_category_posts(
        &self,
        category_slug: &str,
        page: Option<&str>,
    ) -> Result<CategoryFeed, DomainError> {
        let category = self
            .categories
            .find_published_by_slug(category_slug)
            .await?
            .ok_or_else(|| DomainError::not_found("category", category_slug))?;

        let scope = PostScope::Category {
            category_id: category.id,
        };
        let page = self.paginate(scope, page).await?;
        Ok(CategoryFeed { category, page })
    }

    pub(crate) async fn list_profile_posts(
        &self,
        username: &str,
        viewer_id: Option<i64>,
        page: Option<&str>,
    ) -> Result<ProfileFeed, DomainError> {
        let profile = self
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::not_found("user", username))?
            .user;

        let scope = PostScope::Author {
            author_id: profile.id,
            include_hidden: viewer_id == Some(profile.id),
        };
        let page = self.paginate(scope, page).await?;
        Ok(ProfileFeed { profile, page })
    }

    pub(crate) async fn get_post_detail(
        &self,
        post_id: i64,
        viewer_id: Option<i64>,
    ) -> Result<PostDetail, DomainError> {
        let post = self
            .posts
            .get_post_view(post_id)
            .await?
            .filter(|view| view.is_visible_to(viewer_id, Utc::now()))
            .ok_or_else(|| DomainError::not_found("post", post_id))?;

        let comments = self.comments.list_published_comments(post_id).await?;
        Ok(PostDetail { post, comments })
    }

    pub(crate) async fn create_post(
        &self,
        author_id: i64,
        draft: PostDraft,
    ) -> Result<Post, DomainError> {
        let draft = draft.validate()?;
        self.ensure_references_exist(&draft).await?;

        let image = match draft.image {
            ImageChange::Set(path) => Some(path),
            ImageChange::Keep | ImageChange::Clear => None,
        };
        let new_post = NewPost {
            title: draft.title,
            text: draft.text,
            image,
            pub_date: draft.pub_date,
            author_id,
            category_id: draft.category_id,
            location_id: draft.location_id,
        };
        let post = self.posts.create_post(new_post).await?;
        info!(post_id = post.id, author_id, "post created");
        Ok(post)
    }

    /// The post as its author may edit it; anyone else is redirected.
    pub(crate) async fn get_post_for_edit(
        &self,
        actor_id: i64,
        post_id: i64,
    ) -> Result<Post, DomainError> {
        let post = self
            .posts
            .get_post(post_id)
            .await?
            .ok_or_else(|| DomainError::not_found("post", post_id))?;
        ensure_can_modify(actor_id, &post)?;
        Ok(post)
    }

    pub(crate) async fn update_post(
        &self,
        actor_id: i64,
        post_id: i64,
        draft: PostDraft,
    ) -> Result<Post, DomainError> {
        let current = self.get_post_for_edit(actor_id, post_id).await?;
        let draft = draft.validate()?;
        self.ensure_references_exist(&draft).await?;

        let patch = PostPatch {
            image: draft.image.apply(current.image),
            title: draft.title,
            text: draft.text,
            pub_date: draft.pub_date,
            category_id: draft.category_id,
            location_id: draft.location_id,
        };
        let post = self
            .posts
            .update_post_owned(post_id, actor_id, patch)
            .await?
            .ok_or_else(|| DomainError::not_found("post", post_id))?;
        info!(post_id, actor_id, "post updated");
        Ok(post)
    }

    pub(crate) async fn delete_post(&self, actor_id: i64, post_id: i64) -> Result<(), DomainError> {
        self.get_post_for_edit(actor_id, post_id).await?;

        let deleted = self.posts.delete_post_owned(post_id, actor_id).await?;
        if !deleted {
            return Err(DomainError::not_found("post", post_id));
        }
        info!(post_id, actor_id, "post deleted");
        Ok(())
    }

    /// Where authoring flows land after success.
    pub(crate) async fn author_profile(&self, user_id: i64) -> Result<RedirectTarget, DomainError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("user", user_id))?;
        Ok(RedirectTarget::Profile {
            username: user.username,
        })
    }

    async fn ensure_references_exist(&self, draft: &ValidPostDraft) -> Result<(), DomainError> {
        if !self.categories.category_exists(draft.category_id).await? {
            return Err(DomainError::Validation {
                field: "category",
                message: INVALID_CHOICE,
            });
        }
        if let Some(location_id) = draft.location_id
            && !self.categories.location_exists(location_id).await?
        {
            return Err(DomainError::Validation {
                field: "location",
                message: INVALID_CHOICE,
            });
        }
        Ok(())
    }

    async fn paginate(
        &self,
        scope: PostScope,
        page: Option<&str>,
    ) -> Result<Page<PostView>, DomainError> {
        let now = Utc::now();
        let count = self.posts.count_posts(scope, now).await?;
        let pagination = resolve_page(page, count, PAGE_SIZE);
        let items = self.posts.list_posts(scope, now, pagination).await?;

        Ok(Page {
            items,
            number: pagination.page,
            num_pages: num_pages(count, PAGE_SIZE),
            count,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::BlogService;
    use crate::data::memory::InMemoryBlog;
    use crate::domain::access::RedirectTarget;
    use crate::domain::error::DomainError;
    use crate::domain::post::PostDraft;

    type Service = BlogService<InMemoryBlog, InMemoryBlog, InMemoryBlog, InMemoryBlog>;

    fn service(repo: &InMemoryBlog) -> Service {
        BlogService::new(repo.clone(), repo.clone(), repo.clone(), repo.clone())
    }

    fn draft(category_id: i64) -> PostDraft {
        PostDraft {
            title: "  My trip  ".to_string(),
            text: "  It was long  ".to_string(),
            location_id: None,
            pub_date: "2024-05-01".to_string(),
            category_id: Some(category_id),
            image: Some("posts/trip.jpg".to_string()),
            image_clear: false,
        }
    }

    fn ids(page: &crate::domain::pagination::Page<crate::domain::post::PostView>) -> Vec<i64> {
        page.items.iter().map(|view| view.post.id).collect()
    }

    #[tokio::test]
    async fn public_feed_hides_unpublished_future_and_hidden_category_posts() {
        let repo = InMemoryBlog::new();
        let author = repo.add_user("author");
        let open = repo.add_category("travel", true);
        let closed = repo.add_category("drafts", false);
        let past = Utc::now() - Duration::days(1);

        let visible = repo.add_post(author.id, Some(open.id), true, past);
        let uncategorized = repo.add_post(author.id, None, true, past);
        repo.add_post(author.id, Some(open.id), false, past);
        repo.add_post(author.id, Some(closed.id), true, past);
        repo.add_post(author.id, Some(open.id), true, Utc::now() + Duration::days(1));

        let page = service(&repo)
            .list_public_posts(None)
            .await
            .expect("feed must load");

        assert_eq!(page.count, 2);
        assert_eq!(ids(&page), vec![uncategorized.id, visible.id]);
    }

    #[tokio::test]
    async fn feed_is_ordered_by_pub_date_and_annotated_with_comment_count() {
        let repo = InMemoryBlog::new();
        let author = repo.add_user("author");
        let category = repo.add_category("travel", true);
        let older = repo.add_post(author.id, Some(category.id), true, Utc::now() - Duration::days(3));
        let newer = repo.add_post(author.id, Some(category.id), true, Utc::now() - Duration::days(1));
        repo.add_comment(older.id, author.id, true);
        repo.add_comment(older.id, author.id, false);

        let page = service(&repo).list_public_posts(None).await.unwrap();

        assert_eq!(ids(&page), vec![newer.id, older.id]);
        assert_eq!(page.items[1].comment_count, 2);
    }

    #[tokio::test]
    async fn pages_hold_ten_items_and_clamp_past_the_end() {
        let repo = InMemoryBlog::new();
        let author = repo.add_user("author");
        let category = repo.add_category("travel", true);
        for day in 1..=23 {
            repo.add_post(author.id, Some(category.id), true, Utc::now() - Duration::days(day));
        }
        let service = service(&repo);

        let first = service.list_public_posts(None).await.unwrap();
        assert_eq!(first.items.len(), 10);
        assert_eq!(first.num_pages, 3);
        assert!(first.has_next());

        let beyond = service.list_public_posts(Some("42")).await.unwrap();
        assert_eq!(beyond.number, 3);
        assert_eq!(beyond.items.len(), 3);
    }

    #[tokio::test]
    async fn category_feed_requires_published_category() {
        let repo = InMemoryBlog::new();
        repo.add_category("drafts", false);
        let service = service(&repo);

        let err = service
            .list_category_posts("drafts", None)
            .await
            .expect_err("unpublished category");
        assert!(matches!(err, DomainError::NotFound(_)));

        let err = service
            .list_category_posts("missing", None)
            .await
            .expect_err("missing category");
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn category_feed_only_lists_that_category() {
        let repo = InMemoryBlog::new();
        let author = repo.add_user("author");
        let travel = repo.add_category("travel", true);
        let food = repo.add_category("food", true);
        let past = Utc::now() - Duration::days(1);
        let trip = repo.add_post(author.id, Some(travel.id), true, past);
        repo.add_post(author.id, Some(food.id), true, past);
        repo.add_post(author.id, Some(travel.id), false, past);

        let feed = service(&repo)
            .list_category_posts("travel", None)
            .await
            .unwrap();

        assert_eq!(feed.category.slug, "travel");
        assert_eq!(ids(&feed.page), vec![trip.id]);
    }

    #[tokio::test]
    async fn profile_shows_hidden_posts_only_to_owner() {
        let repo = InMemoryBlog::new();
        let author = repo.add_user("author");
        let reader = repo.add_user("reader");
        let category = repo.add_category("travel", true);
        let past = Utc::now() - Duration::days(1);
        repo.add_post(author.id, Some(category.id), true, past);
        repo.add_post(author.id, Some(category.id), false, past);
        repo.add_post(author.id, Some(category.id), true, Utc::now() + Duration::days(2));
        repo.add_post(reader.id, Some(category.id), true, past);
        let service = service(&repo);

        let own = service
            .list_profile_posts("author", Some(author.id), None)
            .await
            .unwrap();
        assert_eq!(own.page.count, 3);

        let other = service
            .list_profile_posts("author", Some(reader.id), None)
            .await
            .unwrap();
        assert_eq!(other.page.count, 1);

        let anonymous = service.list_profile_posts("author", None, None).await.unwrap();
        assert_eq!(anonymous.page.count, 1);
        assert_eq!(anonymous.profile.username, "author");
    }

    #[tokio::test]
    async fn profile_of_unknown_user_is_not_found() {
        let repo = InMemoryBlog::new();
        let err = service(&repo)
            .list_profile_posts("ghost", None, None)
            .await
            .expect_err("unknown user");
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn future_post_detail_is_not_found_for_others_but_open_to_author() {
        let repo = InMemoryBlog::new();
        let author = repo.add_user("author");
        let reader = repo.add_user("reader");
        let category = repo.add_category("travel", true);
        let post = repo.add_post(author.id, Some(category.id), true, Utc::now() + Duration::days(1));
        let service = service(&repo);

        let err = service
            .get_post_detail(post.id, None)
            .await
            .expect_err("anonymous must not see tomorrow's post");
        assert!(matches!(err, DomainError::NotFound(_)));
        assert!(service.get_post_detail(post.id, Some(reader.id)).await.is_err());

        let detail = service
            .get_post_detail(post.id, Some(author.id))
            .await
            .expect("author sees own post");
        assert_eq!(detail.post.post.id, post.id);
    }

    #[tokio::test]
    async fn detail_lists_only_published_comments_for_every_viewer() {
        let repo = InMemoryBlog::new();
        let author = repo.add_user("author");
        let commenter = repo.add_user("commenter");
        let category = repo.add_category("travel", true);
        let post = repo.add_post(author.id, Some(category.id), true, Utc::now() - Duration::days(1));
        let first = repo.add_comment(post.id, commenter.id, true);
        repo.add_comment(post.id, commenter.id, false);
        let second = repo.add_comment(post.id, author.id, true);
        let service = service(&repo);

        for viewer in [None, Some(author.id), Some(commenter.id)] {
            let detail = service.get_post_detail(post.id, viewer).await.unwrap();
            let comment_ids: Vec<i64> = detail.comments.iter().map(|c| c.comment.id).collect();
            assert_eq!(comment_ids, vec![first.id, second.id]);
        }
    }

    #[tokio::test]
    async fn post_in_unpublished_category_stays_hidden_until_published() {
        let repo = InMemoryBlog::new();
        let author = repo.add_user("author");
        let reader = repo.add_user("reader");
        let category = repo.add_category("secret", false);
        let service = service(&repo);

        let post = service
            .create_post(author.id, draft(category.id))
            .await
            .expect("post must persist");
        assert!(service.get_post_detail(post.id, Some(reader.id)).await.is_err());
        assert_eq!(service.list_public_posts(None).await.unwrap().count, 0);

        repo.set_category_published(category.id, true);
        assert!(service.get_post_detail(post.id, Some(reader.id)).await.is_ok());
    }

    #[tokio::test]
    async fn create_post_stamps_author_and_normalizes_fields() {
        let repo = InMemoryBlog::new();
        let author = repo.add_user("author");
        let category = repo.add_category("travel", true);

        let post = service(&repo)
            .create_post(author.id, draft(category.id))
            .await
            .unwrap();

        assert_eq!(post.author_id, author.id);
        assert_eq!(post.title, "My trip");
        assert_eq!(post.text, "It was long");
        assert_eq!(post.image.as_deref(), Some("posts/trip.jpg"));
    }

    #[tokio::test]
    async fn create_post_rejects_unknown_category_and_location() {
        let repo = InMemoryBlog::new();
        let author = repo.add_user("author");
        let category = repo.add_category("travel", true);
        let service = service(&repo);

        let err = service.create_post(author.id, draft(999)).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation { field: "category", .. }));

        let mut with_location = draft(category.id);
        with_location.location_id = Some(999);
        let err = service.create_post(author.id, with_location).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation { field: "location", .. }));

        let location = repo.add_location("Moscow");
        let mut with_location = draft(category.id);
        with_location.location_id = Some(location.id);
        assert!(service.create_post(author.id, with_location).await.is_ok());
    }

    #[tokio::test]
    async fn non_author_update_redirects_to_post_and_changes_nothing() {
        let repo = InMemoryBlog::new();
        let author = repo.add_user("author");
        let intruder = repo.add_user("intruder");
        let category = repo.add_category("travel", true);
        let post = repo.add_post(author.id, Some(category.id), true, Utc::now());

        let err = service(&repo)
            .update_post(intruder.id, post.id, draft(category.id))
            .await
            .expect_err("must be denied");

        assert!(matches!(
            err,
            DomainError::AccessDenied(RedirectTarget::PostDetail { post_id }) if post_id == post.id
        ));
        assert_eq!(repo.post(post.id), Some(post));
    }

    #[tokio::test]
    async fn resubmitting_unchanged_update_is_idempotent() {
        let repo = InMemoryBlog::new();
        let author = repo.add_user("author");
        let category = repo.add_category("travel", true);
        let service = service(&repo);
        let created = service.create_post(author.id, draft(category.id)).await.unwrap();

        let mut resubmit = draft(category.id);
        resubmit.image = None;
        let first = service
            .update_post(author.id, created.id, resubmit.clone())
            .await
            .unwrap();
        let second = service
            .update_post(author.id, created.id, resubmit)
            .await
            .unwrap();

        assert_eq!(first, created);
        assert_eq!(second, created);
    }

    #[tokio::test]
    async fn image_clear_removes_current_image() {
        let repo = InMemoryBlog::new();
        let author = repo.add_user("author");
        let category = repo.add_category("travel", true);
        let service = service(&repo);
        let created = service.create_post(author.id, draft(category.id)).await.unwrap();

        let mut clear = draft(category.id);
        clear.image = None;
        clear.image_clear = true;
        let updated = service.update_post(author.id, created.id, clear).await.unwrap();

        assert_eq!(updated.image, None);
    }

    #[tokio::test]
    async fn delete_post_by_author_removes_it_with_comments() {
        let repo = InMemoryBlog::new();
        let author = repo.add_user("author");
        let category = repo.add_category("travel", true);
        let post = repo.add_post(author.id, Some(category.id), true, Utc::now());
        let comment = repo.add_comment(post.id, author.id, true);

        service(&repo).delete_post(author.id, post.id).await.unwrap();

        assert!(repo.post(post.id).is_none());
        assert!(repo.comment(comment.id).is_none());
    }

    #[tokio::test]
    async fn delete_missing_post_is_not_found() {
        let repo = InMemoryBlog::new();
        let author = repo.add_user("author");
        let err = service(&repo).delete_post(author.id, 77).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn author_profile_points_at_current_username() {
        let repo = InMemoryBlog::new();
        let author = repo.add_user("author");
        let target = service(&repo).author_profile(author.id).await.unwrap();
        assert_eq!(
            target,
            RedirectTarget::Profile {
                username: "author".to_string()
            }
        );
    }
}
