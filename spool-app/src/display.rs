use spool_social::threads::{PostRecord, PostView};

const RULE_WIDTH: usize = 50;

pub fn render_post(post: &PostRecord) -> String {
    format!(
        "\nTime: {}\nText: {}\n{}\n",
        post.formatted_time(),
        post.text(),
        "-".repeat(RULE_WIDTH)
    )
}

pub fn render_posts(posts: &[PostRecord]) -> String {
    let mut out = format!("\nFound {} posts:\n", posts.len());
    for post in posts {
        out.push_str(&render_post(post));
    }
    out
}

pub fn render_json(posts: &[PostRecord]) -> serde_json::Result<String> {
    let views: Vec<PostView> = posts.iter().map(PostRecord::to_view).collect();
    serde_json::to_string_pretty(&views)
}
