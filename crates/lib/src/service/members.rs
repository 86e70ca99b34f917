use serde_json::json;
use tracing::info;

use super::{BoardService, ServiceError};
use crate::{
    Result,
    model::{ActivityAction, BoardId, Member, Role, UserId, UserSummary, validate_title},
    protocol::{AddMemberRequest, BoardEvent},
};

impl BoardService {
    /// Add a user to a board as a regular member. Admin only.
    pub async fn add_member(
        &self,
        user: UserId,
        board_id: BoardId,
        request: AddMemberRequest,
    ) -> Result<Member> {
        let name = validate_title("Name", &request.name)?;
        self.ensure_admin(board_id, user, "add members").await?;
        let _guard = self.inner.board_locks.lock(board_id).await;
        self.board(board_id).await?;

        let member = Member {
            board_id,
            user: UserSummary {
                id: request.user_id,
                name,
                email: request.email,
            },
            role: Role::Member,
        };
        if !self.storage().add_member(member.clone()).await {
            return Err(ServiceError::AlreadyMember {
                user_id: request.user_id,
            }
            .into());
        }
        self.record(
            board_id,
            user,
            None,
            ActivityAction::MemberAdded,
            json!({ "name": member.user.name, "email": member.user.email }),
        )
        .await;
        self.publish(board_id, BoardEvent::MemberAdded(member.clone()))
            .await;
        info!(%board_id, member = %member.user.id, "added member");
        Ok(member)
    }

    /// Remove a member. Admin only; admins cannot remove themselves and
    /// nobody can remove the owner.
    pub async fn remove_member(
        &self,
        user: UserId,
        board_id: BoardId,
        member_id: UserId,
    ) -> Result<Member> {
        self.ensure_admin(board_id, user, "remove members").await?;
        if user == member_id {
            return Err(ServiceError::CannotRemoveSelf.into());
        }
        let _guard = self.inner.board_locks.lock(board_id).await;
        if self.board(board_id).await?.owner_id == member_id {
            return Err(ServiceError::CannotRemoveOwner.into());
        }

        let removed = self
            .storage()
            .remove_member(board_id, member_id)
            .await
            .ok_or(ServiceError::MemberNotFound {
                board_id,
                user_id: member_id,
            })?;
        self.record(
            board_id,
            user,
            None,
            ActivityAction::MemberRemoved,
            json!({ "name": removed.user.name, "email": removed.user.email }),
        )
        .await;
        self.publish(
            board_id,
            BoardEvent::MemberRemoved {
                user_id: member_id,
            },
        )
        .await;
        info!(%board_id, member = %member_id, "removed member");
        Ok(removed)
    }
}
