use crate::models::*;
use crate::services::ParticipationService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    post,
    path = "/participation/verify",
    tag = "participation",
    request_body = VerifyRequest,
    responses(
        (status = 200, description = "校验完成 (无效码也返回 200, valid = false)", body = VerifyResponse),
        (status = 400, description = "二维码为空")
    )
)]
/// 校验二维码抽奖资格:
/// - 未注册的码 -> valid = false
/// - 已注册且无参与记录 -> eligible = true
/// - 已参与 -> eligible = false, claimed 返回领取状态
pub async fn verify(
    service: web::Data<ParticipationService>,
    payload: web::Json<VerifyRequest>,
) -> Result<HttpResponse> {
    match service.verify(&payload.qr_code).await {
        Ok(data) => Ok(HttpResponse::Ok().json(ApiResponse::success(data))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/participation/spin",
    tag = "participation",
    request_body = SpinRequest,
    responses(
        (status = 200, description = "抽奖成功", body = SpinResponse),
        (status = 400, description = "二维码为空"),
        (status = 404, description = "二维码未注册"),
        (status = 409, description = "已参与 / 无可用奖品 / 并发冲突")
    )
)]
/// 进行一次抽奖:
/// 1. 服务端重新校验注册与参与状态
/// 2. 按权重随机选择奖品 (固定顺序, 边界平局偏向靠前奖品)
/// 3. 乐观扣减库存并写参与记录 (同一事务)
pub async fn spin(
    service: web::Data<ParticipationService>,
    payload: web::Json<SpinRequest>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    // 记录来源 IP, 现场排查重复刷码用
    let ip_address = req
        .connection_info()
        .realip_remote_addr()
        .map(|ip| ip.to_string());
    match service.spin(&payload.qr_code, ip_address).await {
        Ok(data) => Ok(HttpResponse::Ok().json(ApiResponse::success(data))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/participation/claim",
    tag = "participation",
    request_body = ClaimRequest,
    responses(
        (status = 200, description = "领取成功 (幂等)", body = ClaimResponse),
        (status = 400, description = "二维码为空"),
        (status = 404, description = "无参与记录")
    )
)]
/// 领取奖品, 重复调用幂等返回
pub async fn claim(
    service: web::Data<ParticipationService>,
    payload: web::Json<ClaimRequest>,
) -> Result<HttpResponse> {
    match service.claim(&payload.qr_code).await {
        Ok(data) => Ok(HttpResponse::Ok().json(ApiResponse::success(data))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/participation/prizes",
    tag = "participation",
    responses(
        (status = 200, description = "获取奖品列表成功", body = [PrizeResponse])
    )
)]
/// 获取当前启用的奖品配置（转盘扇区展示用）
pub async fn get_prizes(service: web::Data<ParticipationService>) -> Result<HttpResponse> {
    match service.list_prizes().await {
        Ok(list) => Ok(HttpResponse::Ok().json(ApiResponse::success(list))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/participation/records",
    tag = "participation",
    params(
        ("page" = Option<u32>, Query, description = "页码 (默认1)"),
        ("per_page" = Option<u32>, Query, description = "每页数量 (默认20)")
    ),
    responses(
        (status = 200, description = "获取参与记录成功", body = PaginatedResponse<ParticipantRecordResponse>)
    )
)]
/// 分页获取参与记录（倒序, 运营查询用）
pub async fn get_records(
    service: web::Data<ParticipationService>,
    query: web::Query<RecordQuery>,
) -> Result<HttpResponse> {
    match service.list_records(&query.into_inner()).await {
        Ok(page) => Ok(HttpResponse::Ok().json(ApiResponse::success(page))),
        Err(e) => Ok(e.error_response()),
    }
}

/// 路由配置
pub fn participation_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/participation")
            .route("/verify", web::post().to(verify))
            .route("/spin", web::post().to(spin))
            .route("/claim", web::post().to(claim))
            .route("/prizes", web::get().to(get_prizes))
            .route("/records", web::get().to(get_records)),
    );
}
