// src/store/scripts.rs
//
// Lua run atomically by the store. Level records are laid out as
// `<seq>:<id byte length>:<id><payload>`; a record is live only while the
// existence map holds exactly its seq for its id and the level map points at
// the record's own level (seqs repeat across levels).

macro_rules! with_record_parser {
    ($body:literal) => {
        concat!(
            r#"
local function parse_record(record)
  local a = string.find(record, ':', 1, true)
  local b = string.find(record, ':', a + 1, true)
  local idlen = tonumber(string.sub(record, a + 1, b - 1))
  local seq = string.sub(record, 1, a - 1)
  local id = string.sub(record, b + 1, b + idlen)
  return seq, id, string.sub(record, b + idlen + 1)
end
"#,
            $body
        )
    };
}

// KEYS: counter, level list, count_map, level_map
// ARGV: payload, id, level, max sequence
pub(crate) const PUSH_SCRIPT: &str = r#"
local current = tonumber(redis.call('GET', KEYS[1]) or '0')
if current >= tonumber(ARGV[4]) then
  return redis.error_reply('ERR sequence exhausted for ' .. KEYS[1])
end
local seq = string.format('%d', redis.call('INCR', KEYS[1]))
local id = ARGV[2]
redis.call('RPUSH', KEYS[2], seq .. ':' .. string.len(id) .. ':' .. id .. ARGV[1])
redis.call('HSET', KEYS[3], id, seq)
redis.call('HSET', KEYS[4], id, ARGV[3])
return tonumber(seq)
"#;

// KEYS: level lists 1..N, count_map, level_map
pub(crate) const POP_SCRIPT: &str = with_record_parser!(
    r#"
local n = #KEYS - 2
local count_map = KEYS[n + 1]
local level_map = KEYS[n + 2]
for i = 1, n do
  while true do
    local record = redis.call('LPOP', KEYS[i])
    if not record then
      break
    end
    local seq, id, payload = parse_record(record)
    if redis.call('HGET', count_map, id) == seq
        and redis.call('HGET', level_map, id) == tostring(i) then
      redis.call('HDEL', count_map, id)
      redis.call('HDEL', level_map, id)
      return payload
    end
  end
end
return false
"#
);

// KEYS: level_map, count_map, level lists 1..N
// ARGV: id
pub(crate) const COUNT_WITHIN_LEVEL_SCRIPT: &str = with_record_parser!(
    r#"
local id = ARGV[1]
local level = redis.call('HGET', KEYS[1], id)
local target = redis.call('HGET', KEYS[2], id)
if not level or not target then
  return false
end
local list = KEYS[2 + tonumber(level)]
if not list then
  return redis.error_reply('ERR level ' .. level .. ' out of range for ' .. id)
end
local target_seq = tonumber(target)
local ahead = 0
for _, record in ipairs(redis.call('LRANGE', list, 0, -1)) do
  local seq, rid = parse_record(record)
  if tonumber(seq) >= target_seq then
    break
  end
  if redis.call('HGET', KEYS[2], rid) == seq
      and redis.call('HGET', KEYS[1], rid) == level then
    ahead = ahead + 1
  end
end
return {tonumber(level), ahead}
"#
);

// KEYS: level lists 1..N
pub(crate) const LENGTHS_SCRIPT: &str = r#"
local lengths = {}
for i, key in ipairs(KEYS) do
  lengths[i] = redis.call('LLEN', key)
end
return lengths
"#;
