use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::infrastructure::jwt::SESSION_COOKIE;
use crate::presentation::forms::{FieldView, FormView, Widget};
use crate::presentation::handlers::auth::{LoginFormDto, RegistrationFormDto};
use crate::presentation::handlers::comments::CommentFormDto;
use crate::presentation::handlers::posts::{
    AuthorDto, CategoryDto, CategoryPageDto, CategoryRefDto, CommentDto, PageInfoDto,
    PostDetailDto, PostFormDto, PostPageDto, PostSummaryDto,
};
use crate::presentation::handlers::profile::{ProfileDto, ProfileFormDto, ProfilePageDto};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::presentation::handlers::posts::index,
        crate::presentation::handlers::posts::category_posts,
        crate::presentation::handlers::posts::post_detail,
        crate::presentation::handlers::posts::create_post_form,
        crate::presentation::handlers::posts::create_post,
        crate::presentation::handlers::posts::edit_post_form,
        crate::presentation::handlers::posts::edit_post,
        crate::presentation::handlers::posts::delete_post_confirm,
        crate::presentation::handlers::posts::delete_post,
        crate::presentation::handlers::comments::add_comment,
        crate::presentation::handlers::comments::edit_comment_form,
        crate::presentation::handlers::comments::edit_comment,
        crate::presentation::handlers::comments::delete_comment_confirm,
        crate::presentation::handlers::comments::delete_comment,
        crate::presentation::handlers::profile::profile,
        crate::presentation::handlers::profile::edit_profile_form,
        crate::presentation::handlers::profile::edit_profile,
        crate::presentation::handlers::auth::registration_form,
        crate::presentation::handlers::auth::register,
        crate::presentation::handlers::auth::login_form,
        crate::presentation::handlers::auth::login,
        crate::presentation::handlers::auth::logout
    ),
    components(
        schemas(
            Widget,
            FieldView,
            FormView,
            PostFormDto,
            CommentFormDto,
            ProfileFormDto,
            RegistrationFormDto,
            LoginFormDto,
            AuthorDto,
            CategoryRefDto,
            CategoryDto,
            PostSummaryDto,
            PageInfoDto,
            PostPageDto,
            CategoryPageDto,
            CommentDto,
            PostDetailDto,
            ProfileDto,
            ProfilePageDto
        )
    ),
    tags(
        (name = "posts", description = "Feeds and post authoring"),
        (name = "comments", description = "Comments on posts"),
        (name = "profile", description = "User profiles"),
        (name = "auth", description = "Registration and sessions")
    ),
    modifiers(&SecurityAddon)
)]
pub(crate) struct ApiDoc;

pub(crate) struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let mut components = openapi.components.take().unwrap_or_default();
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
        components.add_security_scheme(
            "session_cookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(SESSION_COOKIE))),
        );
        openapi.components = Some(components);
    }
}
