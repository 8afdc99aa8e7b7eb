use serde::{Deserialize, Deserializer};

/// 获取当前 UTC 时间戳（毫秒）
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Deserialize `null` (or a missing field, with `#[serde(default)]`) as `T::default()`.
///
/// The fleet API sends `"assignedDriverIds": null` for zones that never had
/// an assignment.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
