// src/utils/rdconfig.rs
use redis::{aio::MultiplexedConnection, Client};

pub async fn get_redis_connection(redis_url: &str) -> redis::RedisResult<MultiplexedConnection> {
    let client = Client::open(redis_url)?;
    client.get_multiplexed_async_connection().await
}
