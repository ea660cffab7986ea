use actix_cors::Cors;

pub fn create_cors() -> Cors {
    Cors::default()
        .allowed_origin_fn(|_, _req_head| {
            // 展会现场摊位机器来源不固定, 放开来源限制
            true
        })
        .allowed_methods(vec!["GET", "POST", "OPTIONS"])
        // 防止前端自定义 Header 导致预检失败
        .allow_any_header()
        .max_age(3600)
}
